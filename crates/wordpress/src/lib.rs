//! WordPress REST API access: transport, post normalization, fetch
//! strategies and view-state holders.

pub mod error;
pub mod fetcher;
pub mod hooks;
pub mod http;
pub mod normalize;
pub mod raw;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use async_trait::async_trait;
use url::Url;

pub use error::FetchError;
pub use fetcher::{FeaturedReport, FeaturedTier, PostFetcher, TierOutcome};
pub use hooks::{Resource, ResourceState};
pub use http::HttpTransport;
pub use normalize::normalize_post;
pub use raw::{RawCategory, RawPost, RawPostStub};

/// Performs a single GET against the upstream API.
///
/// Non-2xx responses are errors; a 404 maps to [`FetchError::NotFound`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: Url) -> Result<serde_json::Value, FetchError>;
}
