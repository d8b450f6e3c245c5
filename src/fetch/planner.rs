//! Refresh planning.
//!
//! Turns a requested key set into the subset that actually needs a network
//! round-trip: keys whose entry is empty or older than its TTL.

use std::collections::BTreeSet;

use time::OffsetDateTime;

use crate::cache::{CacheConfig, CacheSnapshot, CollectionKey};

/// Keys split by whether they need fetching. Both lists are deduplicated and
/// sorted so plans are deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshPlan {
    /// Empty or stale keys.
    pub fetch: Vec<CollectionKey>,
    /// Keys whose cached data is still within its TTL.
    pub fresh: Vec<CollectionKey>,
}

impl RefreshPlan {
    pub fn build(
        keys: impl IntoIterator<Item = CollectionKey>,
        snapshot: &CacheSnapshot,
        config: &CacheConfig,
        now: OffsetDateTime,
    ) -> Self {
        let requested: BTreeSet<CollectionKey> = keys.into_iter().collect();
        let mut plan = Self::default();

        for key in requested {
            let needs_fetch = match snapshot.entry(key) {
                None => true,
                Some(entry) => entry.is_empty() || entry.is_stale_at(config.ttl(key), now),
            };

            if needs_fetch {
                plan.fetch.push(key);
            } else {
                plan.fresh.push(key);
            }
        }

        plan
    }

    pub fn is_noop(&self) -> bool {
        self.fetch.is_empty()
    }
}
