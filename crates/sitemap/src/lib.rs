//! Sitemap generation from the upstream post and category listings.

pub mod error;
pub mod generator;
pub mod xml;

pub use error::SitemapError;
pub use generator::{SitemapGenerator, build_entries};
pub use xml::render_sitemap;
