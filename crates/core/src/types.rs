use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blog post as consumed by presentation layers.
///
/// Every field is always populated; missing upstream data is replaced by a
/// fallback during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPost {
    pub id: u64,
    pub title: String,
    /// Excerpt with all markup stripped
    pub excerpt_text: String,
    pub content_html: String,
    pub image_url: String,
    /// Name of the first taxonomy term
    pub category: String,
    /// Upstream category ids, used to look up related posts
    pub category_ids: Vec<u64>,
    pub author: String,
    pub estimated_read_minutes: u32,
    /// Short pt-BR date, e.g. "05 mar. 2024"
    pub formatted_date: String,
    pub slug: String,
    pub link: String,
    pub modified_at: String,
    pub status: String,
    pub is_sticky: bool,
}

impl CanonicalPost {
    /// Read time as displayed on post cards
    pub fn read_time_label(&self) -> String {
        format!("{} min", self.estimated_read_minutes)
    }
}

/// Category as listed by the upstream API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub post_count: u64,
}

/// Minimal post record needed for sitemap entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub slug: String,
    pub modified: String,
    pub date: String,
}

/// Sitemap `<changefreq>` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<url>` block of a sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: NaiveDate,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

impl SitemapEntry {
    /// Priority as written to `<priority>` (one decimal place)
    pub fn priority_label(&self) -> String {
        format!("{:.1}", self.priority)
    }
}
