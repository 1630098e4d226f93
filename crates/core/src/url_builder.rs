//! Request URL construction against the configured API base.

use crate::config::{ApiConfig, validate_base_url};
use crate::error::Result;
use url::Url;

/// One query parameter; `None` values are never serialized.
pub type Param = (String, Option<String>);

/// Shorthand for building a [`Param`] from anything displayable.
pub fn param(key: &str, value: impl ToString) -> Param {
    (key.to_string(), Some(value.to_string()))
}

/// Builds fully qualified upstream URLs.
///
/// Default parameters from [`ApiConfig::defaults`] are merged under the
/// caller's parameters: on a key collision the caller's value replaces the
/// default, including an explicit `None`, which removes the key.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    defaults: Vec<Param>,
}

impl UrlBuilder {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let base = validate_base_url(&api.base_url, "api.base_url")?;
        Ok(Self {
            base,
            defaults: api.defaults.to_pairs(),
        })
    }

    /// Build `base + endpoint` with defaults merged under `params`.
    pub fn build(&self, endpoint: &str, params: &[Param]) -> Url {
        self.compose(endpoint, &merge(self.defaults.clone(), params))
    }

    /// Build `base + endpoint` with only the caller's parameters.
    pub fn build_without_defaults(&self, endpoint: &str, params: &[Param]) -> Url {
        self.compose(endpoint, &merge(Vec::with_capacity(params.len()), params))
    }

    fn compose(&self, endpoint: &str, params: &[Param]) -> Url {
        let mut url = self.base.clone();

        // Base URLs are checked for `cannot_be_a_base` on construction,
        // so path_segments_mut always succeeds here.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(endpoint.split('/').filter(|s| !s.is_empty()));
        }

        let present: Vec<(&str, &str)> = params
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .collect();

        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }

        url
    }
}

/// Later keys replace earlier ones in place, keeping first-seen order
fn merge(mut merged: Vec<Param>, params: &[Param]) -> Vec<Param> {
    for (key, value) in params {
        match merged.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;

    fn builder() -> UrlBuilder {
        UrlBuilder::new(&Config::default().api).unwrap()
    }

    fn query_values(url: &Url, key: &str) -> Vec<String> {
        url.query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    #[test]
    fn test_build_with_defaults() {
        let url = builder().build("/posts", &[]);
        assert_eq!(
            url.as_str(),
            "https://api.geossinteticos.blog/wp-json/wp/v2/posts?per_page=10&_embed=true&orderby=date&order=desc"
        );
    }

    #[test]
    fn test_override_replaces_default() {
        let url = builder().build("/posts", &[param("per_page", 3)]);
        assert_eq!(query_values(&url, "per_page"), vec!["3"]);
        assert_eq!(query_values(&url, "orderby"), vec!["date"]);
    }

    #[test]
    fn test_none_values_are_omitted() {
        let url = builder().build(
            "/posts",
            &[
                ("sticky".to_string(), None),
                ("_embed".to_string(), None),
                param("slug", "geo-1"),
            ],
        );
        assert!(query_values(&url, "sticky").is_empty());
        assert!(query_values(&url, "_embed").is_empty());
        assert_eq!(query_values(&url, "slug"), vec!["geo-1"]);
        assert!(!url.as_str().contains("null"));
    }

    #[test]
    fn test_without_defaults() {
        let url = builder().build_without_defaults("/posts/7", &[param("_embed", true)]);
        assert_eq!(
            url.as_str(),
            "https://api.geossinteticos.blog/wp-json/wp/v2/posts/7?_embed=true"
        );

        let bare = builder().build_without_defaults("/categories", &[]);
        assert_eq!(
            bare.as_str(),
            "https://api.geossinteticos.blog/wp-json/wp/v2/categories"
        );
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        let url = builder().build_without_defaults(
            "/posts",
            &[param("page", 1), param("slug", "a"), param("page", 2)],
        );
        assert_eq!(url.query(), Some("page=2&slug=a"));
    }

    #[test]
    fn test_query_values_are_encoded() {
        let url = builder().build("/posts", &[param("slug", "geo têxtil&co")]);
        assert_eq!(query_values(&url, "slug"), vec!["geo têxtil&co"]);
        assert!(url.as_str().contains("slug=geo+t%C3%AAxtil%26co"));
    }

    #[test]
    fn test_trailing_slash_base() {
        let mut api = Config::default().api;
        api.base_url = "https://cms.example.com/wp-json/wp/v2/".to_string();
        let url = UrlBuilder::new(&api)
            .unwrap()
            .build_without_defaults("/posts", &[]);
        assert_eq!(url.as_str(), "https://cms.example.com/wp-json/wp/v2/posts");
    }

    #[test]
    fn test_malformed_base_is_config_error() {
        let mut api = Config::default().api;
        api.base_url = "::::".to_string();
        assert!(UrlBuilder::new(&api).is_err());
    }
}
