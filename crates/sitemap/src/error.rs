use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sitemap is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] geoblog_core::Error),
}

pub type Result<T> = std::result::Result<T, SitemapError>;
