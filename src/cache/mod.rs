//! Collection cache.
//!
//! Holds every collection the storefront renders from, keyed by
//! [`CollectionKey`]. Entries carry their fetch time so the fetch
//! orchestrator can decide what is stale:
//!
//! - **Store**: session-lifetime entries, written only by the orchestrator
//! - **Snapshot**: immutable view read by the layout composer
//! - **Config**: default TTL (5 minutes) plus per-key overrides

mod config;
mod keys;
mod store;

pub use config::CacheConfig;
pub use keys::{CollectionKey, UnknownCollectionKey};
pub use store::{CacheEntry, CacheSnapshot, CacheStore, Epoch};
