pub mod init;
pub mod posts;
pub mod serve;
pub mod sitemap;

use anyhow::{Context, Result};
use geoblog_core::{Config, parse_config};
use std::path::Path;

/// Overrides `api.base_url` from the environment.
pub const API_URL_ENV: &str = "GEOBLOG_API_URL";

/// Load geoblog.toml, falling back to built-in defaults when the file is
/// absent, then apply the environment override.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        parse_config(path).with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    apply_api_override(config, std::env::var(API_URL_ENV).ok())
}

fn apply_api_override(mut config: Config, api_url: Option<String>) -> Result<Config> {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        config.api.base_url = url.trim().to_string();
    }
    config
        .validate()
        .with_context(|| format!("Invalid configuration (check {})", API_URL_ENV))?;
    Ok(config)
}
