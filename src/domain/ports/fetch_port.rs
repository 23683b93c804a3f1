//! Port definition for remote resource retrieval.

use async_trait::async_trait;
use bytes::Bytes;

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Errors produced while retrieving a remote resource.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success status code.
    #[error("http status {0}")]
    Status(u16),
    /// Response bytes arrived but could not be decoded as an image.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Port for issuing plain HTTP GET requests.
/// Implementations must be thread-safe.
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Fetches the raw response body for `url`.
    async fn fetch_bytes(&self, url: &str) -> FetchResult<Bytes>;

    /// Fetches the response body for `url` decoded as text.
    async fn fetch_text(&self, url: &str) -> FetchResult<String>;
}
