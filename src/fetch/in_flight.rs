use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::cache::CollectionKey;

/// Tracks collections that currently have a request on the wire.
#[derive(Default, Clone)]
pub struct InFlightKeys {
    keys: Arc<DashMap<CollectionKey, ()>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InFlightError {
    #[error("fetch already in progress for `{key}`")]
    AlreadyFetching { key: CollectionKey },
}

impl InFlightKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, key: CollectionKey) -> Result<FetchGuard, InFlightError> {
        use dashmap::mapref::entry::Entry;

        match self.keys.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Ok(FetchGuard {
                    key,
                    keys: Arc::clone(&self.keys),
                })
            }
            Entry::Occupied(_) => Err(InFlightError::AlreadyFetching { key }),
        }
    }

    pub fn contains(&self, key: CollectionKey) -> bool {
        self.keys.contains_key(&key)
    }
}

/// Marks `key` as in flight until dropped.
pub struct FetchGuard {
    key: CollectionKey,
    keys: Arc<DashMap<CollectionKey, ()>>,
}

impl FetchGuard {
    pub fn key(&self) -> CollectionKey {
        self.key
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}
