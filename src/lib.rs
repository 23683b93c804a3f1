//! netstash - an asynchronous remote-resource cache.
//!
//! Given a URL, the engine hands back an in-memory decoded resource (image
//! or text), downloading it in the background the first time the URL is
//! requested. Concurrent requests for the same URL share a single download,
//! and callers poll for completion without ever blocking, so the cache is
//! safe to query once per frame from a render loop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Domain layer containing entities and port definitions.
pub mod domain;
/// Infrastructure layer containing the cache engine and HTTP adapter.
pub mod infrastructure;

pub use domain::entities::{ImagePoll, ResourceKind, SharedImage, SharedText, TextPoll};
pub use domain::ports::{FetchError, FetchPort, FetchResult};
pub use infrastructure::{CacheStats, HttpFetcher, ResourceCache, ResourceCacheConfig};

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, used as the default user-agent prefix.
pub const NAME: &str = "netstash";
