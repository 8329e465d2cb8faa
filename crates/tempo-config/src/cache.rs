//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default TTL for date-range query results, in seconds.
const fn default_query_ttl_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// How long a date-range query result stays fresh. The current-document
    /// cache has no TTL and is only invalidated by writes.
    #[serde(default = "default_query_ttl_secs")]
    pub query_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            query_ttl_secs: default_query_ttl_secs(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_five_minutes() {
        let config = CacheConfig::default();
        assert_eq!(config.query_ttl(), Duration::from_secs(5 * 60));
    }
}
