//! Collection store.
//!
//! One entry per [`CollectionKey`], created empty at construction and only
//! ever overwritten. Data and fetch timestamp are replaced under a single
//! write guard so no reader can observe one without the other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::debug;

use crate::util::lock::{LockSite, RecoverRwLock};

use super::keys::CollectionKey;

const SOURCE: &str = "cache::store";

/// Monotonic change counter delivered to key observers.
pub type Epoch = u64;

/// Current state of one cached collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CollectionKey,
    pub data: Arc<Vec<Value>>,
    /// When `data` was last written by a successful fetch.
    pub timestamp: Option<OffsetDateTime>,
    pub is_loading: bool,
}

impl CacheEntry {
    pub fn empty(key: CollectionKey) -> Self {
        Self {
            key,
            data: Arc::new(Vec::new()),
            timestamp: None,
            is_loading: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stale when never fetched, or when older than `ttl` at `now`.
    pub fn is_stale_at(&self, ttl: Duration, now: OffsetDateTime) -> bool {
        match self.timestamp {
            None => true,
            Some(fetched_at) => {
                let age_ms = (now - fetched_at).whole_milliseconds();
                age_ms > ttl.as_millis() as i128
            }
        }
    }
}

/// Immutable view of every entry, handed to pure consumers such as the
/// layout composer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    entries: HashMap<CollectionKey, CacheEntry>,
}

impl CacheSnapshot {
    pub fn entry(&self, key: CollectionKey) -> Option<&CacheEntry> {
        self.entries.get(&key)
    }

    /// Items of `key`, empty when the key has no entry.
    pub fn items(&self, key: CollectionKey) -> &[Value] {
        self.entries
            .get(&key)
            .map(|entry| entry.data.as_slice())
            .unwrap_or(&[])
    }

    /// True once `key` has been populated by at least one fetch.
    pub fn is_available(&self, key: CollectionKey) -> bool {
        self.entries
            .get(&key)
            .is_some_and(|entry| entry.timestamp.is_some())
    }

    /// Build a snapshot by hand; keys not supplied stay absent.
    pub fn with_collection(mut self, key: CollectionKey, data: Vec<Value>) -> Self {
        self.entries.insert(
            key,
            CacheEntry {
                key,
                data: Arc::new(data),
                timestamp: Some(OffsetDateTime::UNIX_EPOCH),
                is_loading: false,
            },
        );
        self
    }
}

/// Session-lifetime store of fetched collections.
///
/// Shared by handle (`Arc<CacheStore>`); only the fetch orchestrator writes.
pub struct CacheStore {
    entries: RwLock<HashMap<CollectionKey, CacheEntry>>,
    watchers: HashMap<CollectionKey, watch::Sender<Epoch>>,
    epoch_counter: AtomicU64,
}

impl CacheStore {
    pub fn new() -> Self {
        let entries = CollectionKey::ALL
            .into_iter()
            .map(|key| (key, CacheEntry::empty(key)))
            .collect();
        let watchers = CollectionKey::ALL
            .into_iter()
            .map(|key| (key, watch::channel(0).0))
            .collect();

        Self {
            entries: RwLock::new(entries),
            watchers,
            epoch_counter: AtomicU64::new(0),
        }
    }

    /// Current entry for `key`; the empty default when nothing was stored.
    pub fn get(&self, key: CollectionKey) -> CacheEntry {
        self.entries
            .read_recovered(LockSite::new(SOURCE, "get"))
            .get(&key)
            .cloned()
            .unwrap_or_else(|| CacheEntry::empty(key))
    }

    /// Replace the collection, stamp it with the current time and clear the
    /// loading flag.
    pub fn set(&self, key: CollectionKey, data: Vec<Value>) {
        self.set_at(key, data, OffsetDateTime::now_utc());
    }

    /// Same as [`CacheStore::set`] with an explicit fetch time.
    pub fn set_at(&self, key: CollectionKey, data: Vec<Value>, fetched_at: OffsetDateTime) {
        let item_count = data.len();
        {
            let mut entries = self.entries.write_recovered(LockSite::new(SOURCE, "set"));
            let entry = entries
                .entry(key)
                .or_insert_with(|| CacheEntry::empty(key));
            entry.data = Arc::new(data);
            entry.timestamp = Some(fetched_at);
            entry.is_loading = false;
        }

        let epoch = self.epoch_counter.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(sender) = self.watchers.get(&key) {
            sender.send_replace(epoch);
        }

        debug!(key = %key, item_count, epoch, "Collection stored");
    }

    pub fn set_loading(&self, key: CollectionKey, loading: bool) {
        let mut entries = self
            .entries
            .write_recovered(LockSite::new(SOURCE, "set_loading"));
        entries
            .entry(key)
            .or_insert_with(|| CacheEntry::empty(key))
            .is_loading = loading;
    }

    pub fn is_stale(&self, key: CollectionKey, ttl: Duration) -> bool {
        self.is_stale_at(key, ttl, OffsetDateTime::now_utc())
    }

    pub fn is_stale_at(&self, key: CollectionKey, ttl: Duration, now: OffsetDateTime) -> bool {
        self.get(key).is_stale_at(ttl, now)
    }

    /// Observe writes to `key`. The receiver yields the store-wide epoch of
    /// the most recent `set` for that key.
    pub fn subscribe(&self, key: CollectionKey) -> watch::Receiver<Epoch> {
        match self.watchers.get(&key) {
            Some(sender) => sender.subscribe(),
            None => watch::channel(0).1,
        }
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let entries = self
            .entries
            .read_recovered(LockSite::new(SOURCE, "snapshot"))
            .clone();
        CacheSnapshot { entries }
    }

    /// Keys currently flagged as loading.
    pub fn loading_keys(&self) -> Vec<CollectionKey> {
        let entries = self
            .entries
            .read_recovered(LockSite::new(SOURCE, "loading_keys"));
        let mut keys: Vec<_> = entries
            .values()
            .filter(|entry| entry.is_loading)
            .map(|entry| entry.key)
            .collect();
        keys.sort();
        keys
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
