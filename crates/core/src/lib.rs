pub mod config;
pub mod error;
pub mod types;
pub mod url_builder;

pub use config::{Config, parse_config, parse_config_str};
pub use error::{Error, Result};
pub use types::*;
pub use url_builder::UrlBuilder;
