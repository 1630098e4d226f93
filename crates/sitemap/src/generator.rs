use chrono::{NaiveDate, Utc};
use geoblog_core::config::{Config, MAX_PAGE_SIZE};
use geoblog_core::types::{CategorySummary, ChangeFrequency, PostSummary, SitemapEntry};
use geoblog_core::url_builder::{UrlBuilder, param};
use geoblog_wordpress::fetcher::category_summary;
use geoblog_wordpress::normalize::parse_upstream_datetime;
use geoblog_wordpress::raw::{RawCategory, RawPostStub};
use geoblog_wordpress::{FetchError, Transport};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::xml::render_sitemap;

/// Builds the sitemap document from the full post and category listings.
pub struct SitemapGenerator<T> {
    transport: T,
    urls: UrlBuilder,
    config: Config,
    cancel: Arc<AtomicBool>,
}

impl<T: Transport> SitemapGenerator<T> {
    pub fn new(config: Config, transport: T) -> Result<Self> {
        config.validate()?;
        let urls = UrlBuilder::new(&config.api)?;
        Ok(Self {
            transport,
            urls,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an externally owned cancellation flag
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Setting the flag stops post paging before the next page request.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Page through every published post, newest first.
    ///
    /// Stops on a short or empty page, after `max_pages` pages, or when
    /// cancelled. Any failing page fails the whole listing.
    pub async fn try_all_posts(&self) -> std::result::Result<Vec<PostSummary>, FetchError> {
        let page_size = self.config.sitemap.page_size;
        let max_pages = self.config.sitemap.max_pages;
        let mut summaries = Vec::new();
        let mut page: u32 = 1;

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                info!(page, collected = summaries.len(), "post paging cancelled");
                break;
            }
            if page > max_pages {
                warn!(max_pages, collected = summaries.len(), "post paging hit the page limit");
                break;
            }

            let url = self.urls.build_without_defaults(
                &self.config.api.endpoints.posts,
                &[
                    param("per_page", page_size),
                    param("page", page),
                    param("status", "publish"),
                    param("orderby", "date"),
                    param("order", "desc"),
                ],
            );

            let value = self.transport.get_json(url).await?;
            let stubs: Vec<RawPostStub> = serde_json::from_value(value)?;
            let count = stubs.len();
            debug!(page, count, "fetched post page");

            summaries.extend(stubs.into_iter().map(|stub| PostSummary {
                slug: stub.slug,
                modified: stub.modified,
                date: stub.date,
            }));

            if count < page_size as usize {
                break;
            }
            page += 1;
        }

        Ok(summaries)
    }

    pub async fn all_posts(&self) -> Vec<PostSummary> {
        self.try_all_posts().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to fetch posts for sitemap");
            Vec::new()
        })
    }

    pub async fn try_all_categories(
        &self,
    ) -> std::result::Result<Vec<CategorySummary>, FetchError> {
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
        Ok(raw.into_iter().map(category_summary).collect())
    }

    pub async fn all_categories(&self) -> Vec<CategorySummary> {
        self.try_all_categories().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to fetch categories for sitemap");
            Vec::new()
        })
    }

    /// Entries dated relative to `today`; both listings load concurrently.
    pub async fn entries_on(&self, today: NaiveDate) -> Vec<SitemapEntry> {
        let (posts, categories) = tokio::join!(self.all_posts(), self.all_categories());
        info!(
            posts = posts.len(),
            categories = categories.len(),
            "collected sitemap sources"
        );
        build_entries(&self.config.site.base_url, &posts, &categories, today)
    }

    pub async fn generate_on(&self, today: NaiveDate) -> Result<String> {
        let entries = self.entries_on(today).await;
        render_sitemap(&entries)
    }

    /// The sitemap document for the current (UTC) date
    pub async fn generate(&self) -> Result<String> {
        self.generate_on(Utc::now().date_naive()).await
    }

    /// Generate and write the document, creating parent directories.
    /// Returns the number of `<url>` entries written.
    pub async fn write_sitemap(&self, path: &Path) -> Result<usize> {
        let entries = self.entries_on(Utc::now().date_naive()).await;
        let xml = render_sitemap(&entries)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, xml).await?;

        info!(path = %path.display(), entries = entries.len(), "wrote sitemap");
        Ok(entries.len())
    }
}

/// Static pages first, then one entry per post, then one per category.
///
/// Posts without a slug are skipped; a post whose modified date does not
/// parse is dated `today`.
pub fn build_entries(
    base_url: &str,
    posts: &[PostSummary],
    categories: &[CategorySummary],
    today: NaiveDate,
) -> Vec<SitemapEntry> {
    let base = base_url.trim_end_matches('/');
    let mut entries = Vec::with_capacity(2 + posts.len() + categories.len());

    entries.push(SitemapEntry {
        url: base.to_string(),
        last_modified: today,
        change_frequency: ChangeFrequency::Daily,
        priority: 1.0,
    });
    entries.push(SitemapEntry {
        url: format!("{}/blog", base),
        last_modified: today,
        change_frequency: ChangeFrequency::Daily,
        priority: 0.9,
    });

    for post in posts {
        if post.slug.is_empty() {
            debug!("skipping post without slug");
            continue;
        }
        let last_modified = parse_upstream_datetime(&post.modified)
            .map(|dt| dt.date())
            .unwrap_or(today);
        entries.push(SitemapEntry {
            url: format!("{}/blog/{}", base, post.slug),
            last_modified,
            change_frequency: ChangeFrequency::Weekly,
            priority: 0.8,
        });
    }

    for category in categories {
        if category.slug.is_empty() {
            continue;
        }
        entries.push(SitemapEntry {
            url: format!("{}/blog/categoria/{}", base, category.slug),
            last_modified: today,
            change_frequency: ChangeFrequency::Weekly,
            priority: 0.7,
        });
    }

    entries
}
