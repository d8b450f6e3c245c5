//! Cache configuration.
//!
//! Controls how long each collection stays fresh before the orchestrator
//! fetches it again.

use std::collections::HashMap;
use std::time::Duration;

use super::keys::CollectionKey;

const DEFAULT_TTL_SECS: u64 = 5 * 60;

/// Freshness policy per collection key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied to every key without an override.
    pub default_ttl: Duration,
    /// Per-key TTL overrides.
    pub ttl_overrides: HashMap<CollectionKey, Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            ttl_overrides: HashMap::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            default_ttl: settings.default_ttl,
            ttl_overrides: settings.ttl_overrides.clone(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self, key: CollectionKey) -> Duration {
        self.ttl_overrides
            .get(&key)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    pub fn with_ttl(mut self, key: CollectionKey, ttl: Duration) -> Self {
        self.ttl_overrides.insert(key, ttl);
        self
    }
}
