//! Resource cache engine.
//!
//! This module provides:
//! - Single-flight download deduplication per URL
//! - Generation-checked commits that survive `clear`
//! - A non-blocking poll API for render loops

mod resource_cache;

pub use resource_cache::{CacheStats, ResourceCache};
