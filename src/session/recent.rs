//! Guest-mode "recently viewed" tracking.
//!
//! Signed-in shoppers have their history kept server-side; for guests the
//! list lives in the client key/value store, most recent first, bounded in
//! length and age.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::auth::AuthSession;
use super::kv::{KeyValueStore, StoreError};

const STORAGE_KEY: &str = "recently_viewed";
const DEFAULT_LIMIT: usize = 10;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentlyViewedConfig {
    pub limit: usize,
    pub max_age: Duration,
}

impl Default for RecentlyViewedConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl From<&crate::config::RecentSettings> for RecentlyViewedConfig {
    fn from(settings: &crate::config::RecentSettings) -> Self {
        Self {
            limit: settings.limit,
            max_age: settings.max_age,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentView {
    pub product_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub viewed_at: OffsetDateTime,
}

pub struct RecentlyViewed {
    store: Arc<dyn KeyValueStore>,
    config: RecentlyViewedConfig,
    // Held across load and save so concurrent records never drop each other.
    update: Mutex<()>,
}

impl RecentlyViewed {
    pub fn new(store: Arc<dyn KeyValueStore>, config: RecentlyViewedConfig) -> Self {
        Self {
            store,
            config,
            update: Mutex::new(()),
        }
    }

    pub async fn record(&self, session: &AuthSession, product_id: &str) -> Result<(), StoreError> {
        self.record_at(session, product_id, OffsetDateTime::now_utc())
            .await
    }

    /// Move `product_id` to the front of the list. No-op for signed-in
    /// sessions and blank ids.
    pub async fn record_at(
        &self,
        session: &AuthSession,
        product_id: &str,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let product_id = product_id.trim();
        if session.is_authenticated() || product_id.is_empty() {
            return Ok(());
        }

        let _guard = self.update.lock().await;
        let mut views = self.load_fresh(now).await?;
        views.retain(|view| view.product_id != product_id);
        views.insert(
            0,
            RecentView {
                product_id: product_id.to_string(),
                viewed_at: now,
            },
        );
        views.truncate(self.config.limit);

        debug!(product_id, tracked = views.len(), "Recently viewed updated");
        self.save(&views).await
    }

    pub async fn list(&self) -> Result<Vec<RecentView>, StoreError> {
        self.list_at(OffsetDateTime::now_utc()).await
    }

    pub async fn list_at(&self, now: OffsetDateTime) -> Result<Vec<RecentView>, StoreError> {
        self.load_fresh(now).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.update.lock().await;
        self.store.remove(STORAGE_KEY).await
    }

    async fn load_fresh(&self, now: OffsetDateTime) -> Result<Vec<RecentView>, StoreError> {
        let Some(raw) = self.store.get(STORAGE_KEY).await? else {
            return Ok(Vec::new());
        };

        let views: Vec<RecentView> = match serde_json::from_str(&raw) {
            Ok(views) => views,
            Err(err) => {
                warn!(error = %err, "Discarding malformed recently viewed list");
                return Ok(Vec::new());
            }
        };

        let max_age_ms = self.config.max_age.as_millis() as i128;
        Ok(views
            .into_iter()
            .filter(|view| (now - view.viewed_at).whole_milliseconds() <= max_age_ms)
            .take(self.config.limit)
            .collect())
    }

    async fn save(&self, views: &[RecentView]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(views)?;
        self.store.set(STORAGE_KEY, raw).await
    }
}
