//! Maps upstream posts onto [`CanonicalPost`].
//!
//! [`normalize_post`] is total: every field has a fallback, so any
//! combination of missing title, excerpt, content, media or terms still
//! yields a fully populated post.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use geoblog_core::config::Fallbacks;
use geoblog_core::types::CanonicalPost;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::raw::RawPost;

pub const WORDS_PER_MINUTE: usize = 200;

const PT_BR_MONTHS: [&str; 12] = [
    "jan.", "fev.", "mar.", "abr.", "mai.", "jun.", "jul.", "ago.", "set.", "out.", "nov.", "dez.",
];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Convert one upstream post into the canonical shape
pub fn normalize_post(raw: &RawPost, fallbacks: &Fallbacks) -> CanonicalPost {
    let title = rendered(&raw.title)
        .map(|t| decode_entities(t.trim()).into_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallbacks.title.clone());

    let excerpt_text = rendered(&raw.excerpt)
        .map(|e| decode_entities(&strip_markup(e)).trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| fallbacks.excerpt.clone());

    let content_html = rendered(&raw.content).unwrap_or_default().to_string();
    let estimated_read_minutes = estimate_read_minutes(&content_html);

    let date = raw.date.as_deref().unwrap_or_default();
    let formatted_date = format_date_pt_br(date).unwrap_or_else(|| date.to_string());

    CanonicalPost {
        id: raw.id,
        title,
        excerpt_text,
        content_html,
        image_url: featured_image(raw).unwrap_or(fallbacks.image_url.as_str()).to_string(),
        category: first_category(raw).unwrap_or(fallbacks.category.as_str()).to_string(),
        category_ids: raw.categories.clone(),
        author: fallbacks.author.clone(),
        estimated_read_minutes,
        formatted_date,
        slug: raw.slug.clone().unwrap_or_default(),
        link: raw.link.clone().unwrap_or_default(),
        modified_at: raw.modified.clone().unwrap_or_default(),
        status: raw.status.clone().unwrap_or_default(),
        is_sticky: raw.sticky.unwrap_or(false),
    }
}

fn rendered(field: &Option<crate::raw::Rendered>) -> Option<&str> {
    field.as_ref()?.rendered.as_deref()
}

/// Featured media source URL, else its medium rendition
fn featured_image(raw: &RawPost) -> Option<&str> {
    let media = raw.embedded.as_ref()?.featured_media.first()?;
    media
        .source_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .or_else(|| media.size_url("medium").filter(|u| !u.is_empty()))
}

/// Name of the first term of the first embedded taxonomy
fn first_category(raw: &RawPost) -> Option<&str> {
    raw.embedded
        .as_ref()?
        .terms
        .first()?
        .first()?
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
}

/// Remove every `<...>` tag
pub fn strip_markup(html: &str) -> String {
    TAG_RE.replace_all(html, "").trim().to_string()
}

/// Decode the HTML entities WordPress emits in rendered fields
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    ENTITY_RE.replace_all(text, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = if let Some(hex) = entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = entity.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            named_entity(entity)
        };

        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "hellip" => '…',
        "ndash" => '–',
        "mdash" => '—',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        _ => return None,
    };
    Some(c)
}

/// Minutes to read at 200 words per minute, never less than 1.
///
/// Words are whitespace-separated tokens of the content with markup
/// removed.
pub fn estimate_read_minutes(content_html: &str) -> u32 {
    let words = strip_markup(content_html).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Parse an upstream timestamp.
///
/// WordPress sends `date`/`modified` as site-local time without offset
/// (`2024-03-05T10:00:00`); `*_gmt` variants and other APIs may carry an
/// RFC 3339 offset. A bare date is accepted too.
pub fn parse_upstream_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Short Brazilian Portuguese date: two-digit day, abbreviated month, year
pub fn format_date_pt_br(raw: &str) -> Option<String> {
    let date = parse_upstream_datetime(raw)?.date();
    Some(format!(
        "{:02} {} {}",
        date.day(),
        PT_BR_MONTHS[date.month0() as usize],
        date.year()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{Embedded, RawMedia, RawTerm, Rendered};
    use geoblog_core::config::{DEFAULT_CATEGORY, PLACEHOLDER_IMAGE_URL};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn words(n: usize) -> String {
        format!("<p>{}</p>", "word ".repeat(n))
    }

    fn rendered(s: &str) -> Option<Rendered> {
        Some(Rendered {
            rendered: Some(s.to_string()),
        })
    }

    #[test]
    fn test_end_to_end_scenario() {
        let raw: RawPost = serde_json::from_value(json!({
            "id": 7,
            "slug": "geo-1",
            "title": { "rendered": "Geotêxtil 101" },
            "excerpt": { "rendered": "<p>Intro</p>" },
            "content": { "rendered": words(250) },
            "date": "2024-03-05T10:00:00",
            "sticky": true
        }))
        .unwrap();

        let post = normalize_post(&raw, &Fallbacks::default());
        assert_eq!(post.id, 7);
        assert_eq!(post.title, "Geotêxtil 101");
        assert_eq!(post.excerpt_text, "Intro");
        assert_eq!(post.estimated_read_minutes, 2);
        assert_eq!(post.image_url, PLACEHOLDER_IMAGE_URL);
        assert_eq!(post.category, DEFAULT_CATEGORY);
        assert!(post.is_sticky);
        assert_eq!(post.formatted_date, "05 mar. 2024");
        assert_eq!(post.slug, "geo-1");
        assert_eq!(post.author, "Geossintéticos");
    }

    #[test]
    fn test_totality_over_missing_fields() {
        // Every subset of {media, terms, excerpt, content}
        for mask in 0..16u8 {
            let mut raw = RawPost {
                id: u64::from(mask),
                ..RawPost::default()
            };
            let mut embedded = Embedded::default();
            if mask & 1 != 0 {
                embedded.featured_media.push(RawMedia {
                    source_url: Some("https://cdn.example.com/a.jpg".to_string()),
                    media_details: None,
                });
            }
            if mask & 2 != 0 {
                embedded.terms.push(vec![RawTerm {
                    id: Some(1),
                    name: Some("Drenagem".to_string()),
                    slug: None,
                }]);
            }
            raw.embedded = Some(embedded);
            if mask & 4 != 0 {
                raw.excerpt = rendered("<p>Resumo</p>");
            }
            if mask & 8 != 0 {
                raw.content = rendered(&words(10));
            }

            let post = normalize_post(&raw, &Fallbacks::default());
            assert!(!post.title.is_empty());
            assert!(!post.excerpt_text.is_empty());
            assert!(!post.image_url.is_empty());
            assert!(!post.category.is_empty());
            assert!(!post.author.is_empty());
            assert!(post.estimated_read_minutes >= 1);

            let expected_image = if mask & 1 != 0 {
                "https://cdn.example.com/a.jpg"
            } else {
                PLACEHOLDER_IMAGE_URL
            };
            assert_eq!(post.image_url, expected_image);
            let expected_category = if mask & 2 != 0 { "Drenagem" } else { DEFAULT_CATEGORY };
            assert_eq!(post.category, expected_category);
        }
    }

    #[test]
    fn test_missing_everything_uses_fallbacks() {
        let post = normalize_post(&RawPost::default(), &Fallbacks::default());
        assert_eq!(post.title, "Sem título");
        assert_eq!(post.excerpt_text, "Sem descrição");
        assert_eq!(post.content_html, "");
        assert_eq!(post.formatted_date, "");
        assert_eq!(post.slug, "");
        assert!(!post.is_sticky);
        assert_eq!(post.estimated_read_minutes, 1);
    }

    #[test]
    fn test_image_falls_back_to_medium_rendition() {
        let raw: RawPost = serde_json::from_value(json!({
            "id": 1,
            "_embedded": { "wp:featuredmedia": [{
                "media_details": {
                    "sizes": { "medium": { "source_url": "https://cdn.example.com/m.jpg" } }
                }
            }]}
        }))
        .unwrap();
        let post = normalize_post(&raw, &Fallbacks::default());
        assert_eq!(post.image_url, "https://cdn.example.com/m.jpg");
    }

    #[test]
    fn test_empty_term_list_uses_default_category() {
        let raw: RawPost = serde_json::from_value(json!({
            "id": 1,
            "_embedded": { "wp:term": [[], [{ "name": "tag" }]] }
        }))
        .unwrap();
        let post = normalize_post(&raw, &Fallbacks::default());
        assert_eq!(post.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_custom_fallbacks() {
        let fallbacks = Fallbacks {
            image_url: "https://example.com/none.png".to_string(),
            category: "Outros".to_string(),
            author: "Redação".to_string(),
            ..Fallbacks::default()
        };
        let post = normalize_post(&RawPost::default(), &fallbacks);
        assert_eq!(post.image_url, "https://example.com/none.png");
        assert_eq!(post.category, "Outros");
        assert_eq!(post.author, "Redação");
    }

    #[test]
    fn test_markup_only_excerpt_uses_fallback() {
        let raw = RawPost {
            excerpt: rendered("<p> </p>\n"),
            ..RawPost::default()
        };
        assert_eq!(normalize_post(&raw, &Fallbacks::default()).excerpt_text, "Sem descrição");
    }

    #[test]
    fn test_excerpt_entities_decoded() {
        let raw = RawPost {
            excerpt: rendered("<p>Mantas &amp; grelhas &#8211; guia [&hellip;]</p>\n"),
            title: rendered("Geogrelha: o que é?&#8217;"),
            ..RawPost::default()
        };
        let post = normalize_post(&raw, &Fallbacks::default());
        assert_eq!(post.excerpt_text, "Mantas & grelhas – guia […]");
        assert_eq!(post.title, "Geogrelha: o que é?’");
    }

    #[test]
    fn test_decode_entities_leaves_unknown() {
        assert_eq!(decode_entities("a &bogus; b"), "a &bogus; b");
        assert_eq!(decode_entities("&#x41;&#66;"), "AB");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_read_time_values() {
        assert_eq!(estimate_read_minutes(&words(200)), 1);
        assert_eq!(estimate_read_minutes(&words(201)), 2);
        assert_eq!(estimate_read_minutes(&words(250)), 2);
        assert_eq!(estimate_read_minutes(&words(401)), 3);
    }

    #[test]
    fn test_read_time_zero_words_clamped() {
        assert_eq!(estimate_read_minutes(""), 1);
        assert_eq!(estimate_read_minutes("<p></p>"), 1);
        assert_eq!(estimate_read_minutes("   \n\t "), 1);
    }

    #[test]
    fn test_read_time_monotonic() {
        let mut previous = 0;
        for n in (0..1200).step_by(37) {
            let minutes = estimate_read_minutes(&words(n));
            assert!(minutes >= previous, "{} words gave {} < {}", n, minutes, previous);
            previous = minutes;
        }
    }

    #[test]
    fn test_read_time_ignores_tags() {
        let html = r#"<div class="wp-block"><img src="a.jpg" alt="x"/>one<br/>two</div>"#;
        assert_eq!(strip_markup(html), "onetwo");
        assert_eq!(estimate_read_minutes(html), 1);
    }

    #[test]
    fn test_format_date_pt_br() {
        let cases = [
            ("2024-03-05T10:00:00", "05 mar. 2024"),
            ("2023-12-31T23:59:59", "31 dez. 2023"),
            ("2024-02-01", "01 fev. 2024"),
            ("2024-07-09T08:00:00Z", "09 jul. 2024"),
        ];
        for (raw, expected) in cases {
            assert_eq!(format_date_pt_br(raw).as_deref(), Some(expected));
        }
        assert_eq!(format_date_pt_br("ontem"), None);
        assert_eq!(format_date_pt_br(""), None);
    }

    #[test]
    fn test_offset_dates_keep_their_local_day() {
        assert_eq!(
            format_date_pt_br("2024-03-05T23:30:00-03:00").as_deref(),
            Some("05 mar. 2024")
        );
        assert_eq!(
            format_date_pt_br("2024-03-06T01:15:00+02:00").as_deref(),
            Some("06 mar. 2024")
        );
    }

    #[test]
    fn test_unparseable_date_kept_verbatim() {
        let raw = RawPost {
            date: Some("not-a-date".to_string()),
            ..RawPost::default()
        };
        assert_eq!(
            normalize_post(&raw, &Fallbacks::default()).formatted_date,
            "not-a-date"
        );
    }
}
