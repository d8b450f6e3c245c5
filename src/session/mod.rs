//! Client-held session state: the authentication token and guest-only
//! browsing history.

mod auth;
mod kv;
mod recent;

pub use auth::{AuthSession, AuthToken, LOGIN_PATH, SESSION_EXPIRED_MESSAGE};
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore, StoreError};
pub use recent::{RecentView, RecentlyViewed, RecentlyViewedConfig};
