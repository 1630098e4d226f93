//! Sitemap serialization.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://geossinteticos.blog/blog/geomembranas</loc>
//!     <lastmod>2024-03-05</lastmod>
//!     <changefreq>weekly</changefreq>
//!     <priority>0.8</priority>
//!   </url>
//! </urlset>
//! ```

use geoblog_core::types::SitemapEntry;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use crate::error::Result;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Render entries in order. Text content is escaped by the writer.
pub fn render_sitemap(entries: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::with_capacity(4096)), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(urlset))?;

    for entry in entries {
        write_url(&mut writer, entry)?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    Ok(String::from_utf8(bytes)?)
}

fn write_url(writer: &mut XmlWriter, entry: &SitemapEntry) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("url")))?;
    write_text_element(writer, "loc", &entry.url)?;
    write_text_element(
        writer,
        "lastmod",
        &entry.last_modified.format("%Y-%m-%d").to_string(),
    )?;
    write_text_element(writer, "changefreq", entry.change_frequency.as_str())?;
    write_text_element(writer, "priority", &entry.priority_label())?;
    writer.write_event(Event::End(BytesEnd::new("url")))?;
    Ok(())
}

fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
