//! In-memory WordPress stand-in for tests.
//!
//! Compiled for this crate's unit tests and, behind the `test-util`
//! feature, for dependent crates' tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use url::Url;

use crate::{FetchError, Transport};

type Handler = Arc<dyn Fn(&Url) -> Result<Value, FetchError> + Send + Sync>;

/// Transport answering from a closure and recording every request URL.
///
/// Clones share the handler and the request log.
#[derive(Clone)]
pub struct FakeTransport {
    handler: Handler,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&Url) -> Result<Value, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, url: Url) -> Result<Value, FetchError> {
        self.requests.lock().unwrap().push(url.clone());
        (self.handler)(&url)
    }
}

pub fn query(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn unavailable(url: &Url) -> FetchError {
    FetchError::Status {
        status: 503,
        url: url.to_string(),
    }
}

/// Upstream post; higher ids are newer
pub fn post_json(id: u64, sticky: bool, categories: &[u64]) -> Value {
    json!({
        "id": id,
        "slug": format!("post-{}", id),
        "date": format!("2024-01-{:02}T10:00:00", (id % 28) + 1),
        "modified": format!("2024-02-{:02}T10:00:00", (id % 28) + 1),
        "status": "publish",
        "link": format!("https://cms.example.com/post-{}/", id),
        "title": { "rendered": format!("Post {}", id) },
        "excerpt": { "rendered": "<p>Resumo</p>" },
        "content": { "rendered": "<p>um dois três</p>" },
        "sticky": sticky,
        "categories": categories,
    })
}

fn ids(value: &str) -> Result<Vec<u64>, ()> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().map_err(|_| ()))
        .collect()
}

/// Answer `/posts`, `/posts/{id}` and `/categories` the way WordPress does:
/// `sticky`, `categories`, `exclude` and `slug` filters, newest first,
/// `per_page`/`page` paging.
pub fn simulated(
    posts: Vec<Value>,
    categories: Vec<Value>,
) -> impl Fn(&Url) -> Result<Value, FetchError> + Send + Sync + 'static {
    move |url: &Url| {
        let path = url.path();

        if path.ends_with("/categories") {
            return Ok(Value::Array(categories.clone()));
        }

        if let Some(id) = path.rsplit('/').next().and_then(|s| s.parse::<u64>().ok()) {
            return posts
                .iter()
                .find(|p| p["id"].as_u64() == Some(id))
                .cloned()
                .ok_or_else(|| FetchError::NotFound(url.to_string()));
        }

        let mut matching: Vec<&Value> = posts.iter().collect();

        if query(url, "sticky").as_deref() == Some("true") {
            matching.retain(|p| p["sticky"].as_bool() == Some(true));
        }
        if let Some(value) = query(url, "categories") {
            let wanted = ids(&value).map_err(|_| FetchError::Status {
                status: 400,
                url: url.to_string(),
            })?;
            matching.retain(|p| {
                p["categories"].as_array().is_some_and(|c| {
                    c.iter()
                        .any(|id| id.as_u64().is_some_and(|id| wanted.contains(&id)))
                })
            });
        }
        if let Some(value) = query(url, "exclude") {
            let excluded = ids(&value).unwrap_or_default();
            matching.retain(|p| !p["id"].as_u64().is_some_and(|id| excluded.contains(&id)));
        }
        if let Some(slug) = query(url, "slug") {
            matching.retain(|p| p["slug"].as_str() == Some(slug.as_str()));
        }

        matching.sort_by_key(|p| std::cmp::Reverse(p["id"].as_u64()));

        let per_page: usize = query(url, "per_page")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let page: usize = query(url, "page").and_then(|v| v.parse().ok()).unwrap_or(1);

        let items: Vec<Value> = matching
            .into_iter()
            .skip(per_page * page.saturating_sub(1))
            .take(per_page)
            .cloned()
            .collect();
        Ok(Value::Array(items))
    }
}
