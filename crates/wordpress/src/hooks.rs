//! View-state holders for presentation layers.
//!
//! A [`Resource`] pairs a loader with `{data, loading, error}` state and a
//! `refresh` operation. Each resource owns its own copy of the data;
//! nothing is shared between resources.

use futures::future::BoxFuture;
use geoblog_core::types::CanonicalPost;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::Transport;
use crate::fetcher::PostFetcher;

pub const NOT_FOUND_MESSAGE: &str = "Post não encontrado";

type Loader<D> = Box<dyn Fn() -> BoxFuture<'static, Result<D, String>> + Send + Sync>;

/// Snapshot of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<D> {
    pub data: D,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct Resource<D> {
    state: RwLock<ResourceState<D>>,
    loader: Loader<D>,
}

impl<D: Clone + Default + Send + Sync + 'static> Resource<D> {
    /// A resource starts out loading with default data until the first
    /// [`refresh`](Self::refresh).
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<D, String>> + Send + Sync + 'static,
    {
        Self {
            state: RwLock::new(ResourceState {
                data: D::default(),
                loading: true,
                error: None,
            }),
            loader: Box::new(loader),
        }
    }

    /// Create and load in one step
    pub async fn mounted<F>(loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<D, String>> + Send + Sync + 'static,
    {
        let resource = Self::new(loader);
        resource.refresh().await;
        resource
    }

    /// Run the loader again.
    ///
    /// On failure the previous data is kept and `error` is set.
    pub async fn refresh(&self) {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = (self.loader)().await;

        let mut state = self.state.write().await;
        match result {
            Ok(data) => state.data = data,
            Err(message) => {
                warn!(error = %message, "resource load failed");
                state.error = Some(message);
            }
        }
        state.loading = false;
    }

    pub async fn snapshot(&self) -> ResourceState<D> {
        self.state.read().await.clone()
    }

    pub async fn data(&self) -> D {
        self.state.read().await.data.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }
}

/// Featured posts; `error` is set only when every tier failed
pub fn featured_posts<T>(fetcher: Arc<PostFetcher<T>>, limit: usize) -> Resource<Vec<CanonicalPost>>
where
    T: Transport + 'static,
{
    Resource::new(move || {
        let fetcher = Arc::clone(&fetcher);
        Box::pin(async move {
            let report = fetcher.featured_report(limit).await;
            if report.all_failed() {
                Err("Erro ao carregar posts em destaque".to_string())
            } else {
                Ok(report.posts)
            }
        })
    })
}

pub fn posts_by_category<T>(
    fetcher: Arc<PostFetcher<T>>,
    category: impl Into<String>,
    limit: usize,
) -> Resource<Vec<CanonicalPost>>
where
    T: Transport + 'static,
{
    let category: Arc<str> = Arc::from(category.into());
    Resource::new(move || {
        let fetcher = Arc::clone(&fetcher);
        let category = Arc::clone(&category);
        Box::pin(async move {
            fetcher
                .try_posts_by_category(&category, limit)
                .await
                .map_err(|_| format!("Erro ao carregar posts da categoria {}", category))
        })
    })
}

/// Single post; a missing post sets [`NOT_FOUND_MESSAGE`]
pub fn post_by_id<T>(fetcher: Arc<PostFetcher<T>>, id: u64) -> Resource<Option<CanonicalPost>>
where
    T: Transport + 'static,
{
    Resource::new(move || {
        let fetcher = Arc::clone(&fetcher);
        Box::pin(async move {
            match fetcher.try_post_by_id(id).await {
                Ok(Some(post)) => Ok(Some(post)),
                Ok(None) => Err(NOT_FOUND_MESSAGE.to_string()),
                Err(_) => Err(format!("Erro ao carregar post {}", id)),
            }
        })
    })
}

/// Single post by slug; an empty slug loads nothing and is not an error
pub fn post_by_slug<T>(
    fetcher: Arc<PostFetcher<T>>,
    slug: impl Into<String>,
) -> Resource<Option<CanonicalPost>>
where
    T: Transport + 'static,
{
    let slug: Arc<str> = Arc::from(slug.into());
    Resource::new(move || {
        let fetcher = Arc::clone(&fetcher);
        let slug = Arc::clone(&slug);
        Box::pin(async move {
            if slug.is_empty() {
                return Ok(None);
            }
            match fetcher.try_post_by_slug(&slug).await {
                Ok(Some(post)) => Ok(Some(post)),
                Ok(None) => Err(NOT_FOUND_MESSAGE.to_string()),
                Err(_) => Err("Erro ao carregar o post".to_string()),
            }
        })
    })
}
