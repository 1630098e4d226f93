use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.geossinteticos.blog/wp-json/wp/v2";
pub const DEFAULT_SITE_URL: &str = "https://geossinteticos.blog";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const PLACEHOLDER_IMAGE_URL: &str = "https://images.unsplash.com/photo-1581092918484-8313d4c6e2a8?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80";
pub const DEFAULT_CATEGORY: &str = "Geral";
pub const DEFAULT_AUTHOR: &str = "Geossintéticos";
pub const DEFAULT_TITLE: &str = "Sem título";
pub const DEFAULT_EXCERPT: &str = "Sem descrição";
pub const DEFAULT_FEATURED_CATEGORY: &str = "destaque";

/// WordPress caps `per_page` at 100 for every listing endpoint.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Complete runtime configuration.
///
/// Built once (from TOML or defaults) and handed to the URL builder,
/// fetchers and sitemap generator. Nothing reads configuration from
/// global state.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub site: SiteConfig,
    pub fallbacks: Fallbacks,
    pub sitemap: SitemapConfig,
}

/// Upstream WordPress REST API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the `/wp-json/wp/v2` prefix
    pub base_url: String,
    pub timeout: Duration,
    pub endpoints: Endpoints,
    pub defaults: DefaultParams,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoints: Endpoints::default(),
            defaults: DefaultParams::default(),
        }
    }
}

/// Endpoint paths relative to the API base URL
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub posts: String,
    pub categories: String,
    pub tags: String,
    pub media: String,
    pub users: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            posts: "/posts".to_string(),
            categories: "/categories".to_string(),
            tags: "/tags".to_string(),
            media: "/media".to_string(),
            users: "/users".to_string(),
        }
    }
}

/// Query parameters merged under every request built with defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultParams {
    pub per_page: u32,
    /// Inline featured media and taxonomy terms (`_embed`)
    pub embed: bool,
    pub orderby: String,
    pub order: String,
}

impl Default for DefaultParams {
    fn default() -> Self {
        Self {
            per_page: 10,
            embed: true,
            orderby: "date".to_string(),
            order: "desc".to_string(),
        }
    }
}

impl DefaultParams {
    /// Defaults as query pairs, in the order they are serialized
    pub fn to_pairs(&self) -> Vec<(String, Option<String>)> {
        vec![
            ("per_page".to_string(), Some(self.per_page.to_string())),
            ("_embed".to_string(), self.embed.then(|| "true".to_string())),
            ("orderby".to_string(), Some(self.orderby.clone())),
            ("order".to_string(), Some(self.order.clone())),
        ]
    }
}

/// Public site settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Public site URL used for sitemap locations
    pub base_url: String,
    /// Category identifier queried by the last featured-posts tier
    pub featured_category: String,
    pub featured_limit: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SITE_URL.to_string(),
            featured_category: DEFAULT_FEATURED_CATEGORY.to_string(),
            featured_limit: 4,
        }
    }
}

/// Values substituted when an upstream post lacks a field
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub image_url: String,
    pub category: String,
    pub author: String,
    pub title: String,
    pub excerpt: String,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            title: DEFAULT_TITLE.to_string(),
            excerpt: DEFAULT_EXCERPT.to_string(),
        }
    }
}

/// Sitemap pagination bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub page_size: u32,
    /// Hard stop for an upstream that keeps returning full pages
    pub max_pages: u32,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_pages: 100,
        }
    }
}

/// Raw TOML configuration structure
/// Every section is optional; missing keys take the built-in defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    api: RawApiConfig,
    site: SiteConfig,
    fallbacks: Fallbacks,
    sitemap: SitemapConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawApiConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    endpoints: Endpoints,
    defaults: DefaultParams,
}

/// Parse geoblog.toml from a file path
pub fn parse_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse geoblog.toml from a string (useful for testing)
pub fn parse_config_str(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)?;

    let timeout_secs = raw.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::ConfigParse(
            "api.timeout_secs must be greater than zero".to_string(),
        ));
    }

    let config = Config {
        api: ApiConfig {
            base_url: raw
                .api
                .base_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            endpoints: raw.api.endpoints,
            defaults: raw.api.defaults,
        },
        site: raw.site,
        fallbacks: raw.fallbacks,
        sitemap: raw.sitemap,
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Check the values a request cannot be built without.
    ///
    /// A malformed base URL is fatal here rather than at fetch time, so
    /// fetchers never see an unusable configuration.
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.api.base_url, "api.base_url")?;
        validate_base_url(&self.site.base_url, "site.base_url")?;

        for (name, path) in [
            ("api.endpoints.posts", &self.api.endpoints.posts),
            ("api.endpoints.categories", &self.api.endpoints.categories),
            ("api.endpoints.tags", &self.api.endpoints.tags),
            ("api.endpoints.media", &self.api.endpoints.media),
            ("api.endpoints.users", &self.api.endpoints.users),
        ] {
            if !path.starts_with('/') {
                return Err(Error::ConfigParse(format!(
                    "Endpoint '{}' must start with '/': '{}'",
                    name, path
                )));
            }
        }

        if self.api.defaults.per_page == 0 || self.api.defaults.per_page > MAX_PAGE_SIZE {
            return Err(Error::ConfigParse(format!(
                "api.defaults.per_page must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.sitemap.page_size == 0 || self.sitemap.page_size > MAX_PAGE_SIZE {
            return Err(Error::ConfigParse(format!(
                "sitemap.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.sitemap.max_pages == 0 {
            return Err(Error::ConfigParse(
                "sitemap.max_pages must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse and check a base URL.
///
/// Only absolute http(s) URLs are accepted; anything else cannot carry
/// endpoint path segments.
pub fn validate_base_url(value: &str, field_name: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| Error::InvalidUrl {
        url: value.to_string(),
        reason: format!("{} ({})", e, field_name),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::InvalidUrl {
            url: value.to_string(),
            reason: format!("{} must use http or https", field_name),
        });
    }

    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl {
            url: value.to_string(),
            reason: format!("{} cannot be used as a base URL", field_name),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.endpoints.posts, "/posts");
        assert_eq!(config.api.defaults.per_page, 10);
        assert!(config.api.defaults.embed);
        assert_eq!(config.site.base_url, DEFAULT_SITE_URL);
        assert_eq!(config.site.featured_category, "destaque");
        assert_eq!(config.fallbacks.category, "Geral");
        assert_eq!(config.fallbacks.author, "Geossintéticos");
        assert_eq!(config.sitemap.page_size, 100);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
[api]
base_url = "https://cms.example.com/wp-json/wp/v2"
timeout_secs = 5

[api.defaults]
per_page = 20
embed = false

[site]
base_url = "https://example.com"
featured_category = "12"
featured_limit = 6

[fallbacks]
category = "Outros"

[sitemap]
page_size = 50
max_pages = 3
        "##;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://cms.example.com/wp-json/wp/v2");
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.api.defaults.per_page, 20);
        assert!(!config.api.defaults.embed);
        assert_eq!(config.api.defaults.orderby, "date");
        assert_eq!(config.site.featured_category, "12");
        assert_eq!(config.site.featured_limit, 6);
        assert_eq!(config.fallbacks.category, "Outros");
        assert_eq!(config.fallbacks.title, DEFAULT_TITLE);
        assert_eq!(config.sitemap.page_size, 50);
        assert_eq!(config.sitemap.max_pages, 3);
    }

    #[test]
    fn test_default_params_pairs() {
        let pairs = DefaultParams::default().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("per_page".to_string(), Some("10".to_string())),
                ("_embed".to_string(), Some("true".to_string())),
                ("orderby".to_string(), Some("date".to_string())),
                ("order".to_string(), Some("desc".to_string())),
            ]
        );

        let no_embed = DefaultParams {
            embed: false,
            ..DefaultParams::default()
        };
        assert_eq!(no_embed.to_pairs()[1], ("_embed".to_string(), None));
    }

    #[test]
    fn test_rejects_malformed_base_url() {
        let result = parse_config_str("[api]\nbase_url = \"not a url\"");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("api.base_url"));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = parse_config_str("[site]\nbase_url = \"ftp://example.com\"");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("http or https"));

        let result = parse_config_str("[api]\nbase_url = \"mailto:someone@example.com\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_relative_endpoint() {
        let result = parse_config_str("[api.endpoints]\nposts = \"posts\"");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("api.endpoints.posts"));
    }

    #[test]
    fn test_rejects_out_of_range_page_sizes() {
        assert!(parse_config_str("[api.defaults]\nper_page = 0").is_err());
        assert!(parse_config_str("[api.defaults]\nper_page = 101").is_err());
        assert!(parse_config_str("[sitemap]\npage_size = 500").is_err());
        assert!(parse_config_str("[sitemap]\nmax_pages = 0").is_err());
        assert!(parse_config_str("[api]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn test_rejects_invalid_toml() {
        let result = parse_config_str("[api\nbase_url = 1");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Configuration parse error")
        );
    }
}
