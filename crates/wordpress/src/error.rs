/// Error from an upstream request.
///
/// Fetch operations absorb these into empty results; the `try_*` variants
/// return them to callers that need to tell an outage from "no posts".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network failure, timeout or DNS error.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("HTTP error {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// Upstream reported the resource as missing.
    #[error("not found: {0}")]
    NotFound(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}
