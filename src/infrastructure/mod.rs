//! Infrastructure layer with the cache engine and external adapters.

/// The cache-and-fetch engine.
pub mod cache;
/// Engine configuration.
pub mod config;
/// HTTP retrieval adapter.
pub mod http;

pub use cache::{CacheStats, ResourceCache};
pub use config::ResourceCacheConfig;
pub use http::HttpFetcher;
