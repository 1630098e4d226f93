mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geoblog")]
#[command(
    version,
    about = "WordPress data layer and sitemap service for the Geossintéticos blog",
    long_about = None
)]
struct Cli {
    /// Path to geoblog.toml (built-in defaults when missing)
    #[arg(short, long, global = true, default_value = "geoblog.toml")]
    config: PathBuf,

    /// Log at debug level (otherwise RUST_LOG or info)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Write an example geoblog.toml
    Init {
        /// Directory to write geoblog.toml into
        path: PathBuf,

        /// Upstream WordPress REST base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Public site URL used for sitemap locations
        #[arg(long)]
        site_url: Option<String>,
    },

    /// Serve the dynamic sitemap and JSON endpoints
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
    },

    /// Write sitemap.xml as a build artifact
    Sitemap {
        /// Output file
        #[arg(short, long, default_value = "public/sitemap.xml")]
        output: PathBuf,
    },

    /// Print featured posts as JSON
    Featured {
        /// Number of posts (defaults to site.featured_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Include the per-tier outcome
        #[arg(long)]
        report: bool,
    },

    /// Print a single post as JSON
    Post {
        /// Post slug
        #[arg(required_unless_present = "id")]
        slug: Option<String>,

        /// Look up by numeric id instead of slug
        #[arg(long, conflicts_with = "slug")]
        id: Option<u64>,
    },

    /// Print the newest posts of a category as JSON
    Category {
        /// Category id or slug
        category: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print posts sharing a category with the given post
    Related {
        /// Post to exclude
        id: u64,

        /// Category ids to match (repeatable)
        #[arg(short = 'C', long = "category", required = true)]
        categories: Vec<u64>,

        #[arg(short, long, default_value = "3")]
        limit: usize,
    },

    /// Print all categories, most used first
    Categories,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = cli.config;

    match cli.command {
        Command::Init {
            path,
            api_url,
            site_url,
        } => commands::init::run(path, api_url, site_url).await,
        Command::Serve { port, host } => commands::serve::run(&config, host, port).await,
        Command::Sitemap { output } => commands::sitemap::run(&config, output).await,
        Command::Featured { limit, report } => {
            commands::posts::featured(&config, limit, report).await
        }
        Command::Post { slug, id } => commands::posts::post(&config, slug, id).await,
        Command::Category { category, limit } => {
            commands::posts::category(&config, &category, limit).await
        }
        Command::Related {
            id,
            categories,
            limit,
        } => commands::posts::related(&config, id, &categories, limit).await,
        Command::Categories => commands::posts::categories(&config).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "geoblog", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_post_requires_slug_or_id() {
        assert!(Cli::try_parse_from(["geoblog", "post"]).is_err());
        assert!(Cli::try_parse_from(["geoblog", "post", "mantas"]).is_ok());
        assert!(Cli::try_parse_from(["geoblog", "post", "--id", "7"]).is_ok());
    }

    #[test]
    fn test_related_takes_repeated_categories() {
        let cli = Cli::try_parse_from(["geoblog", "related", "5", "-C", "3", "-C", "4"]).unwrap();
        match cli.command {
            Command::Related { id, categories, limit } => {
                assert_eq!(id, 5);
                assert_eq!(categories, vec![3, 4]);
                assert_eq!(limit, 3);
            }
            _ => panic!("expected related command"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["geoblog", "categories", "--config", "/etc/geoblog.toml"])
                .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/geoblog.toml"));
    }
}
