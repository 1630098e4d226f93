//! Inspection commands: run one fetch operation and print the result as
//! JSON on stdout. Upstream failures exit non-zero instead of printing an
//! empty list.

use anyhow::{Context, Result};
use geoblog_wordpress::{HttpTransport, PostFetcher};
use serde::Serialize;
use std::path::Path;

use super::load_config;

fn fetcher(config_path: &Path) -> Result<PostFetcher<HttpTransport>> {
    let config = load_config(config_path)?;
    let transport = HttpTransport::new(&config.api).context("Failed to create HTTP client")?;
    PostFetcher::new(config, transport).context("Invalid configuration")
}

fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

pub async fn featured(config_path: &Path, limit: Option<usize>, report: bool) -> Result<()> {
    let fetcher = fetcher(config_path)?;
    let limit = limit.unwrap_or(fetcher.config().site.featured_limit);

    let result = fetcher.featured_report(limit).await;
    for tier in &result.tiers {
        match &tier.error {
            Some(error) => eprintln!("   ⚠ {}: {}", tier.tier, error),
            None => eprintln!("   ✓ {}: {} of {} kept", tier.tier, tier.accepted, tier.fetched),
        }
    }

    if result.all_failed() {
        anyhow::bail!("Every featured tier failed; upstream unreachable?");
    }

    if report {
        print_json(&result)
    } else {
        print_json(&result.posts)
    }
}

pub async fn post(config_path: &Path, slug: Option<String>, id: Option<u64>) -> Result<()> {
    let fetcher = fetcher(config_path)?;

    let found = match (id, slug.as_deref()) {
        (Some(id), _) => fetcher
            .try_post_by_id(id)
            .await
            .with_context(|| format!("Failed to fetch post {}", id))?,
        (None, Some(slug)) => fetcher
            .try_post_by_slug(slug)
            .await
            .with_context(|| format!("Failed to fetch post '{}'", slug))?,
        (None, None) => anyhow::bail!("Provide a slug or --id"),
    };

    match found {
        Some(post) => print_json(&post),
        None => anyhow::bail!("Post não encontrado"),
    }
}

pub async fn category(config_path: &Path, category: &str, limit: usize) -> Result<()> {
    let fetcher = fetcher(config_path)?;
    let posts = fetcher
        .try_posts_by_category(category, limit)
        .await
        .with_context(|| format!("Failed to fetch posts of category '{}'", category))?;
    eprintln!("   ✓ {} post(s)", posts.len());
    print_json(&posts)
}

pub async fn related(config_path: &Path, id: u64, categories: &[u64], limit: usize) -> Result<()> {
    let fetcher = fetcher(config_path)?;
    let posts = fetcher
        .try_related_posts(id, categories, limit)
        .await
        .with_context(|| format!("Failed to fetch posts related to {}", id))?;
    eprintln!("   ✓ {} related post(s)", posts.len());
    print_json(&posts)
}

pub async fn categories(config_path: &Path) -> Result<()> {
    let fetcher = fetcher(config_path)?;
    let categories = fetcher
        .try_categories()
        .await
        .context("Failed to fetch categories")?;
    eprintln!("   ✓ {} categor(ies)", categories.len());
    print_json(&categories)
}
