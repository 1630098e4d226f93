//! Upstream (WordPress) record shapes.
//!
//! Only `id` is required. Nested objects are decoded leniently so that
//! odd shapes WordPress emits (an empty array where an object is expected,
//! an error object inside `_embedded`) degrade to `None` instead of
//! failing the whole page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Post as returned by `/posts` (optionally with `_embed`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    pub id: u64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<Rendered>,
    #[serde(default, deserialize_with = "lenient")]
    pub excerpt: Option<Rendered>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<Rendered>,
    #[serde(default, deserialize_with = "lenient")]
    pub sticky: Option<bool>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub categories: Vec<u64>,
    #[serde(default, rename = "_embedded", deserialize_with = "lenient")]
    pub embedded: Option<Embedded>,
}

/// `{ "rendered": "<p>...</p>" }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: Option<String>,
}

/// Associations inlined by `_embed`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Embedded {
    #[serde(default, rename = "wp:featuredmedia", deserialize_with = "lenient_vec")]
    pub featured_media: Vec<RawMedia>,
    /// One list per taxonomy; the first is categories
    #[serde(default, rename = "wp:term", deserialize_with = "lenient_vec")]
    pub terms: Vec<Vec<RawTerm>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedia {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub media_details: Option<MediaDetails>,
}

impl RawMedia {
    /// URL of a named rendition (`thumbnail`, `medium`, `large`, ...)
    pub fn size_url(&self, size: &str) -> Option<&str> {
        self.media_details
            .as_ref()?
            .sizes
            .get(size)?
            .source_url
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaDetails {
    #[serde(default, deserialize_with = "lenient_map")]
    pub sizes: HashMap<String, MediaSize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaSize {
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTerm {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Category as returned by `/categories`
#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// Post fields needed by the sitemap (requested without `_embed`)
#[derive(Debug, Clone, Deserialize)]
pub struct RawPostStub {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub date: String,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

fn lenient_map<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_post_decodes() {
        let post: RawPost = serde_json::from_value(json!({ "id": 1 })).unwrap();
        assert_eq!(post.id, 1);
        assert!(post.title.is_none());
        assert!(post.embedded.is_none());
        assert!(post.categories.is_empty());
    }

    #[test]
    fn test_post_without_id_is_rejected() {
        let result: Result<RawPost, _> = serde_json::from_value(json!({ "slug": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_embedded_media_and_terms() {
        let post: RawPost = serde_json::from_value(json!({
            "id": 3,
            "_embedded": {
                "wp:featuredmedia": [{
                    "source_url": "https://cdn.example.com/full.jpg",
                    "media_details": {
                        "sizes": { "medium": { "source_url": "https://cdn.example.com/m.jpg" } }
                    }
                }],
                "wp:term": [[{ "id": 4, "name": "Geotêxteis", "slug": "geotexteis" }], []]
            }
        }))
        .unwrap();

        let embedded = post.embedded.unwrap();
        let media = &embedded.featured_media[0];
        assert_eq!(media.source_url.as_deref(), Some("https://cdn.example.com/full.jpg"));
        assert_eq!(media.size_url("medium"), Some("https://cdn.example.com/m.jpg"));
        assert_eq!(media.size_url("large"), None);
        assert_eq!(embedded.terms[0][0].name.as_deref(), Some("Geotêxteis"));
    }

    #[test]
    fn test_odd_shapes_degrade_to_none() {
        let post: RawPost = serde_json::from_value(json!({
            "id": 9,
            "title": "plain string",
            "sticky": "yes",
            "categories": null,
            "_embedded": {
                "wp:featuredmedia": [{ "code": "rest_forbidden", "media_details": [] }],
                "wp:term": "broken"
            }
        }))
        .unwrap();

        assert!(post.title.is_none());
        assert!(post.sticky.is_none());
        assert!(post.categories.is_empty());
        let embedded = post.embedded.unwrap();
        assert!(embedded.featured_media[0].source_url.is_none());
        assert!(embedded.featured_media[0].size_url("medium").is_none());
        assert!(embedded.terms.is_empty());
    }
}
