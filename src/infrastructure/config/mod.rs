//! Engine configuration.

/// Configuration for the resource cache engine.
#[derive(Debug, Clone)]
pub struct ResourceCacheConfig {
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum number of downloads in flight at once.
    pub max_concurrent_downloads: usize,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ResourceCacheConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_concurrent_downloads: 4,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResourceCacheConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_concurrent_downloads, 4);
        assert!(config.user_agent.starts_with("netstash/"));
    }
}
