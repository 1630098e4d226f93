//! Post retrieval strategies.
//!
//! Every public operation absorbs upstream failures ("never break the
//! page"): lists degrade to empty, single lookups to `None`, and a
//! `tracing` warning records what went wrong. The `try_*` variants return
//! the error instead.

use geoblog_core::config::{Config, MAX_PAGE_SIZE};
use geoblog_core::types::{CanonicalPost, CategorySummary};
use geoblog_core::url_builder::{Param, UrlBuilder, param};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

use crate::normalize::normalize_post;
use crate::raw::{RawCategory, RawPost};
use crate::{FetchError, Transport};

/// Stage of the featured-posts pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeaturedTier {
    /// Posts pinned upstream
    Sticky,
    /// Newest posts not yet collected
    Recent,
    /// Posts of the configured featured category not yet collected
    Category,
}

impl FeaturedTier {
    pub const ALL: [FeaturedTier; 3] = [
        FeaturedTier::Sticky,
        FeaturedTier::Recent,
        FeaturedTier::Category,
    ];
}

impl fmt::Display for FeaturedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeaturedTier::Sticky => f.write_str("sticky"),
            FeaturedTier::Recent => f.write_str("recent"),
            FeaturedTier::Category => f.write_str("category"),
        }
    }
}

/// Result of running one tier
#[derive(Debug)]
pub enum TierOutcome {
    Fetched(Vec<CanonicalPost>),
    Failed(FetchError),
}

/// What one tier contributed to a featured-posts call
#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub tier: FeaturedTier,
    /// Posts returned by upstream
    pub fetched: usize,
    /// Posts kept after de-duplication and the limit
    pub accepted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Featured posts plus the per-tier trail that produced them
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedReport {
    pub posts: Vec<CanonicalPost>,
    /// Tiers that ran; tiers skipped because the limit was reached are absent
    pub tiers: Vec<TierReport>,
}

impl FeaturedReport {
    /// True when at least one tier ran and none succeeded
    pub fn all_failed(&self) -> bool {
        !self.tiers.is_empty() && self.tiers.iter().all(|t| t.error.is_some())
    }
}

/// Reads posts and categories from the upstream API.
pub struct PostFetcher<T> {
    transport: T,
    urls: UrlBuilder,
    config: Config,
}

impl<T: Transport> PostFetcher<T> {
    /// Fails only on an unusable configuration (malformed base URL)
    pub fn new(config: Config, transport: T) -> geoblog_core::Result<Self> {
        config.validate()?;
        let urls = UrlBuilder::new(&config.api)?;
        Ok(Self {
            transport,
            urls,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn embed_param(&self) -> Param {
        (
            "_embed".to_string(),
            self.config.api.defaults.embed.then(|| "true".to_string()),
        )
    }

    async fn fetch_posts(&self, url: Url) -> Result<Vec<CanonicalPost>, FetchError> {
        let value = self.transport.get_json(url).await?;
        let raw: Vec<RawPost> = serde_json::from_value(value)?;
        Ok(raw
            .iter()
            .map(|post| normalize_post(post, &self.config.fallbacks))
            .collect())
    }

    async fn fetch_post(&self, url: Url) -> Result<CanonicalPost, FetchError> {
        let value = self.transport.get_json(url).await?;
        let raw: RawPost = serde_json::from_value(value)?;
        Ok(normalize_post(&raw, &self.config.fallbacks))
    }

    async fn run_tier(&self, tier: FeaturedTier, remaining: usize, exclude: &[u64]) -> TierOutcome {
        let posts_endpoint = &self.config.api.endpoints.posts;
        let mut params = newest_first(remaining);

        match tier {
            FeaturedTier::Sticky => params.push(param("sticky", true)),
            FeaturedTier::Recent => params.push(("exclude".to_string(), join_ids(exclude))),
            FeaturedTier::Category => {
                params.push(param("categories", &self.config.site.featured_category));
                params.push(("exclude".to_string(), join_ids(exclude)));
            }
        }

        let url = self.urls.build(posts_endpoint, &params);
        match self.fetch_posts(url).await {
            Ok(posts) => TierOutcome::Fetched(posts),
            Err(e) => TierOutcome::Failed(e),
        }
    }

    /// Featured posts with the outcome of each tier.
    ///
    /// Tiers run strictly in order (sticky, recent, featured category);
    /// each later tier excludes the ids already collected and asks only
    /// for the remainder. A failed tier contributes nothing and the next
    /// one runs. The result never exceeds `limit` and holds no duplicate
    /// ids.
    pub async fn featured_report(&self, limit: usize) -> FeaturedReport {
        let mut posts: Vec<CanonicalPost> = Vec::with_capacity(limit);
        let mut seen: HashSet<u64> = HashSet::new();
        let mut tiers = Vec::new();

        for tier in FeaturedTier::ALL {
            if posts.len() >= limit {
                break;
            }

            let remaining = limit - posts.len();
            let exclude: Vec<u64> = posts.iter().map(|p| p.id).collect();

            match self.run_tier(tier, remaining, &exclude).await {
                TierOutcome::Fetched(fetched) => {
                    let fetched_count = fetched.len();
                    let mut accepted = 0;
                    for post in fetched {
                        if posts.len() >= limit {
                            break;
                        }
                        if seen.insert(post.id) {
                            posts.push(post);
                            accepted += 1;
                        }
                    }
                    debug!(%tier, fetched = fetched_count, accepted, "featured tier completed");
                    tiers.push(TierReport {
                        tier,
                        fetched: fetched_count,
                        accepted,
                        error: None,
                    });
                }
                TierOutcome::Failed(e) => {
                    warn!(%tier, error = %e, "featured tier failed, continuing with next tier");
                    tiers.push(TierReport {
                        tier,
                        fetched: 0,
                        accepted: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        FeaturedReport { posts, tiers }
    }

    /// Up to `limit` featured posts; empty when every tier fails
    pub async fn featured_posts(&self, limit: usize) -> Vec<CanonicalPost> {
        let report = self.featured_report(limit).await;
        if report.all_failed() {
            warn!(limit, "all featured tiers failed");
        }
        report.posts
    }

    pub async fn try_posts_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<CanonicalPost>, FetchError> {
        let url = self.urls.build(
            &self.config.api.endpoints.posts,
            &[newest_first(limit), vec![param("categories", category)]].concat(),
        );
        self.fetch_posts(url).await
    }

    /// Newest posts in a category (identifier passed through as given)
    pub async fn posts_by_category(&self, category: &str, limit: usize) -> Vec<CanonicalPost> {
        if limit == 0 {
            return Vec::new();
        }
        self.try_posts_by_category(category, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(category, error = %e, "failed to fetch posts by category");
                Vec::new()
            })
    }

    /// `Ok(None)` when upstream reports the post as missing
    pub async fn try_post_by_id(&self, id: u64) -> Result<Option<CanonicalPost>, FetchError> {
        let endpoint = format!("{}/{}", self.config.api.endpoints.posts, id);
        let url = self
            .urls
            .build_without_defaults(&endpoint, &[self.embed_param()]);

        match self.fetch_post(url).await {
            Ok(post) => Ok(Some(post)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn post_by_id(&self, id: u64) -> Option<CanonicalPost> {
        self.try_post_by_id(id).await.unwrap_or_else(|e| {
            warn!(id, error = %e, "failed to fetch post");
            None
        })
    }

    /// An empty slug matches nothing and issues no request
    pub async fn try_post_by_slug(&self, slug: &str) -> Result<Option<CanonicalPost>, FetchError> {
        if slug.is_empty() {
            return Ok(None);
        }

        let url = self.urls.build_without_defaults(
            &self.config.api.endpoints.posts,
            &[param("slug", slug), self.embed_param()],
        );

        match self.fetch_posts(url).await {
            Ok(posts) => Ok(posts.into_iter().next()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// First post with the given slug
    pub async fn post_by_slug(&self, slug: &str) -> Option<CanonicalPost> {
        self.try_post_by_slug(slug).await.unwrap_or_else(|e| {
            warn!(slug, error = %e, "failed to fetch post by slug");
            None
        })
    }

    pub async fn try_related_posts(
        &self,
        exclude_id: u64,
        category_ids: &[u64],
        limit: usize,
    ) -> Result<Vec<CanonicalPost>, FetchError> {
        if category_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.urls.build(
            &self.config.api.endpoints.posts,
            &[
                newest_first(limit),
                vec![
                    ("categories".to_string(), join_ids(category_ids)),
                    param("exclude", exclude_id),
                ],
            ]
            .concat(),
        );

        let posts = self.fetch_posts(url).await?;
        Ok(posts
            .into_iter()
            .filter(|p| p.id != exclude_id)
            .take(limit)
            .collect())
    }

    /// Newest posts sharing any of `category_ids`, without `exclude_id`
    pub async fn related_posts(
        &self,
        exclude_id: u64,
        category_ids: &[u64],
        limit: usize,
    ) -> Vec<CanonicalPost> {
        self.try_related_posts(exclude_id, category_ids, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(exclude_id, error = %e, "failed to fetch related posts");
                Vec::new()
            })
    }

    pub async fn try_categories(&self) -> Result<Vec<CategorySummary>, FetchError> {
        let url = self.urls.build_without_defaults(
            &self.config.api.endpoints.categories,
            &[
                param("per_page", MAX_PAGE_SIZE),
                param("orderby", "count"),
                param("order", "desc"),
            ],
        );

        let value = self.transport.get_json(url).await?;
        let raw: Vec<RawCategory> = serde_json::from_value(value)?;
        info!(count = raw.len(), "fetched categories");

        Ok(raw.into_iter().map(category_summary).collect())
    }

    /// All categories, most used first
    pub async fn categories(&self) -> Vec<CategorySummary> {
        self.try_categories().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to fetch categories");
            Vec::new()
        })
    }
}

pub fn category_summary(raw: RawCategory) -> CategorySummary {
    CategorySummary {
        id: raw.id,
        slug: raw.slug,
        name: raw.name,
        post_count: raw.count,
    }
}

/// Page size plus date-descending order, regardless of configured defaults
fn newest_first(limit: usize) -> Vec<Param> {
    vec![
        param("per_page", limit.min(MAX_PAGE_SIZE as usize)),
        param("orderby", "date"),
        param("order", "desc"),
    ]
}

/// Comma-separated id list, `None` when empty so the key is omitted
fn join_ids(ids: &[u64]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    Some(
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(","),
    )
}
