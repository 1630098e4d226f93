use anyhow::{Context, Result};
use geoblog_core::config::{DEFAULT_API_URL, DEFAULT_SITE_URL, validate_base_url};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "geoblog.toml";

/// Escape a string for a TOML basic string.
///
/// The template is written by hand to keep its comments, so values are
/// escaped here instead of going through the toml serializer.
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Write an example geoblog.toml into `path`.
///
/// The directory is created when missing. An existing geoblog.toml is
/// never overwritten.
pub async fn run(path: PathBuf, api_url: Option<String>, site_url: Option<String>) -> Result<()> {
    println!("Initializing geoblog configuration: {}", path.display());

    let config_path = path.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists at {}\nHint: Delete it first or use a different directory",
            CONFIG_FILE_NAME,
            config_path.display()
        );
    }

    let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let site_url = site_url.unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    validate_base_url(&api_url, "--api-url")?;
    validate_base_url(&site_url, "--site-url")?;

    fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    write_config(&config_path, &api_url, &site_url)?;

    println!("✓ Wrote {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {} (featured category, fallbacks)", CONFIG_FILE_NAME);
    println!(
        "  2. Check upstream: geoblog --config {} categories",
        config_path.display()
    );
    println!(
        "  3. Serve: geoblog --config {} serve",
        config_path.display()
    );

    Ok(())
}

fn write_config(config_path: &Path, api_url: &str, site_url: &str) -> Result<()> {
    fs::write(config_path, render_template(api_url, site_url))
        .with_context(|| format!("Failed to write {}", config_path.display()))
}

fn render_template(api_url: &str, site_url: &str) -> String {
    format!(
        r#"# geoblog configuration
# Every section is optional; commented values are the built-in defaults.

[api]
# WordPress REST base, including /wp-json/wp/v2
base_url = "{}"
timeout_secs = 10

[api.defaults]
# Merged into every post listing request (per_page is capped at 100)
per_page = 10
embed = true
orderby = "date"
order = "desc"

# [api.endpoints]
# posts = "/posts"
# categories = "/categories"
# tags = "/tags"
# media = "/media"
# users = "/users"

[site]
# Public site URL used for sitemap locations
base_url = "{}"
# Category queried by the last featured-posts tier (WordPress expects an id)
featured_category = "destaque"
featured_limit = 4

[fallbacks]
category = "Geral"
author = "Geossintéticos"
title = "Sem título"
excerpt = "Sem descrição"
# image_url = "https://..."

[sitemap]
page_size = 100
# Stop paging after this many pages even if upstream keeps returning full pages
max_pages = 100
"#,
        toml_escape_string(api_url),
        toml_escape_string(site_url),
    )
}
