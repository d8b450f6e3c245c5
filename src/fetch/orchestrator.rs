//! Batch refresh with per-key failure isolation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, histogram};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheConfig, CacheStore, CollectionKey};
use crate::notify::Notifier;
use crate::session::{AuthSession, AuthToken, SESSION_EXPIRED_MESSAGE};
use crate::util::lock::{LockSite, RecoverRwLock};

use super::error::FetchError;
use super::in_flight::InFlightKeys;
use super::planner::RefreshPlan;
use super::source::CollectionSource;

const SOURCE: &str = "fetch::orchestrator";
const METRIC_FETCH_TOTAL: &str = "vitrine_fetch_total";
const METRIC_FETCH_MS: &str = "vitrine_fetch_ms";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub cache: CacheConfig,
    /// Upper bound for one collection request.
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl From<&crate::config::Settings> for FetchConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            cache: CacheConfig::from(&settings.cache),
            request_timeout: settings.api.request_timeout,
        }
    }
}

/// Outcome of one [`FetchOrchestrator::refresh`] call. Carries key names
/// only; data is read back through the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub fetched: Vec<CollectionKey>,
    pub failed: Vec<(CollectionKey, FetchError)>,
    pub fresh: Vec<CollectionKey>,
    pub already_in_flight: Vec<CollectionKey>,
    /// Results that settled after [`FetchOrchestrator::detach`] and were dropped.
    pub discarded: Vec<CollectionKey>,
}

impl RefreshReport {
    pub fn issued_requests(&self) -> usize {
        self.fetched.len() + self.failed.len() + self.discarded.len()
    }
}

/// Sole writer of the collection cache.
pub struct FetchOrchestrator {
    config: FetchConfig,
    store: Arc<CacheStore>,
    source: Arc<dyn CollectionSource>,
    session: Arc<AuthSession>,
    notifier: Arc<Notifier>,
    in_flight: InFlightKeys,
    errors: RwLock<HashMap<CollectionKey, FetchError>>,
    detached: AtomicBool,
}

impl FetchOrchestrator {
    pub fn new(
        config: FetchConfig,
        store: Arc<CacheStore>,
        source: Arc<dyn CollectionSource>,
        session: Arc<AuthSession>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            source,
            session,
            notifier,
            in_flight: InFlightKeys::new(),
            errors: RwLock::new(HashMap::new()),
            detached: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Refresh every key that is empty or stale.
    ///
    /// One request per key is issued concurrently; all branches settle before
    /// any result is inspected. A failed key keeps its previous data and gets
    /// an entry in the error ledger; successful keys are written as usual.
    #[instrument(skip_all)]
    pub async fn refresh(&self, keys: impl IntoIterator<Item = CollectionKey>) -> RefreshReport {
        let plan = RefreshPlan::build(
            keys,
            &self.store.snapshot(),
            &self.config.cache,
            OffsetDateTime::now_utc(),
        );

        let mut report = RefreshReport {
            fresh: plan.fresh.clone(),
            ..RefreshReport::default()
        };

        let mut guards = Vec::with_capacity(plan.fetch.len());
        for key in plan.fetch {
            match self.in_flight.acquire(key) {
                Ok(guard) => guards.push(guard),
                Err(_) => report.already_in_flight.push(key),
            }
        }

        if guards.is_empty() {
            for key in &report.fresh {
                self.store.set_loading(*key, false);
            }
            debug!(
                fresh = report.fresh.len(),
                in_flight = report.already_in_flight.len(),
                "Refresh skipped: nothing to fetch"
            );
            return report;
        }

        for guard in &guards {
            self.store.set_loading(guard.key(), true);
        }

        let token = self.session.token();
        let branches = guards.into_iter().map(|guard| {
            let token = token.clone();
            async move {
                let started_at = Instant::now();
                let result = self.fetch_one(guard.key(), token.as_ref()).await;
                (guard, result, started_at.elapsed())
            }
        });
        let settled = join_all(branches).await;

        let mut auth_expired = false;
        for (guard, result, elapsed) in settled {
            let key = guard.key();
            histogram!(METRIC_FETCH_MS, "key" => key.as_str())
                .record(elapsed.as_secs_f64() * 1000.0);

            if self.is_detached() {
                debug!(key = %key, "Dropping late response for detached orchestrator");
                self.store.set_loading(key, false);
                report.discarded.push(key);
                continue;
            }

            match result {
                Ok(items) => {
                    info!(
                        key = %key,
                        item_count = items.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Collection refreshed"
                    );
                    self.store.set(key, items);
                    self.clear_error(key);
                    counter!(METRIC_FETCH_TOTAL, "key" => key.as_str(), "outcome" => "success")
                        .increment(1);
                    report.fetched.push(key);
                }
                Err(error) => {
                    warn!(
                        key = %key,
                        error = %error,
                        error_kind = error.kind(),
                        "Collection refresh failed; keeping previous data"
                    );
                    self.store.set_loading(key, false);
                    counter!(METRIC_FETCH_TOTAL, "key" => key.as_str(), "outcome" => error.kind())
                        .increment(1);

                    if error == FetchError::Unauthorized {
                        auth_expired = true;
                    } else if !key.is_cosmetic() {
                        self.notify_failure(key);
                    }

                    self.record_error(key, error.clone());
                    report.failed.push((key, error));
                }
            }
            drop(guard);
        }

        if auth_expired {
            self.session.expire();
            self.notifier.error(SESSION_EXPIRED_MESSAGE);
        }

        report
    }

    /// Refresh every known collection.
    pub async fn refresh_all(&self) -> RefreshReport {
        self.refresh(CollectionKey::ALL).await
    }

    /// Last failure recorded for `key`, cleared by the next successful fetch.
    pub fn error_for(&self, key: CollectionKey) -> Option<FetchError> {
        self.errors
            .read_recovered(LockSite::new(SOURCE, "error_for"))
            .get(&key)
            .cloned()
    }

    pub fn errors(&self) -> Vec<(CollectionKey, FetchError)> {
        let mut errors: Vec<_> = self
            .errors
            .read_recovered(LockSite::new(SOURCE, "errors"))
            .iter()
            .map(|(key, error)| (*key, error.clone()))
            .collect();
        errors.sort_by_key(|(key, _)| *key);
        errors
    }

    /// Stop applying results. Responses that settle afterwards are dropped
    /// instead of being written to the cache.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        info!("Fetch orchestrator detached");
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    async fn fetch_one(
        &self,
        key: CollectionKey,
        token: Option<&AuthToken>,
    ) -> Result<Vec<Value>, FetchError> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.source.fetch(key, token)).await {
            Ok(Ok(body)) => extract_collection(key, &body),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }

    fn notify_failure(&self, key: CollectionKey) {
        let message = if self.store.get(key).is_empty() {
            format!("Couldn't load {}.", key.label())
        } else {
            format!("Couldn't refresh {}; showing saved results.", key.label())
        };
        self.notifier.error(message);
    }

    fn record_error(&self, key: CollectionKey, error: FetchError) {
        self.errors
            .write_recovered(LockSite::new(SOURCE, "record_error"))
            .insert(key, error);
    }

    fn clear_error(&self, key: CollectionKey) {
        self.errors
            .write_recovered(LockSite::new(SOURCE, "clear_error"))
            .remove(&key);
    }
}

/// Pull the collection for `key` out of a response body. A missing or null
/// field is an empty collection; any other non-list value is malformed.
pub fn extract_collection(key: CollectionKey, body: &Value) -> Result<Vec<Value>, FetchError> {
    let field = key.payload_field();
    match body.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(FetchError::decode(format!(
            "field `{field}` holds {} instead of a list",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
