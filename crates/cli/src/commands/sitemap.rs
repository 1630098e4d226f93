use anyhow::{Context, Result};
use geoblog_sitemap::SitemapGenerator;
use geoblog_wordpress::HttpTransport;
use std::path::{Path, PathBuf};

use super::load_config;

/// Write sitemap.xml as a build artifact
pub async fn run(config_path: &Path, output: PathBuf) -> Result<()> {
    println!("🗺  Building sitemap...");

    let config = load_config(config_path)?;
    println!("   Upstream: {}", config.api.base_url);
    println!("   Site: {}", config.site.base_url);
    println!("   Output: {}", output.display());
    println!();

    let transport = HttpTransport::new(&config.api).context("Failed to create HTTP client")?;
    let generator = SitemapGenerator::new(config, transport).context("Invalid configuration")?;

    let entries = generator
        .write_sitemap(&output)
        .await
        .with_context(|| format!("Failed to write sitemap to {}", output.display()))?;

    if entries <= 2 {
        println!("⚠ Only static pages were written; check the upstream logs above");
    }
    println!("✅ Sitemap complete!");
    println!("   {} URL(s) in {}", entries, output.display());

    Ok(())
}
