//! Transient notifications ("toasts").
//!
//! Failures that the shopper can act on (log in again, retry later) and
//! outcomes of mutation intents are pushed here; the view drains the queue and
//! shows each toast for `ttl_ms`.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::util::lock::{LockSite, RecoverMutex};

const SOURCE: &str = "notify";
const DEFAULT_TTL_MS: u64 = 4_000;
const ERROR_TTL_MS: u64 = 6_000;
const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Info => "info",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub text: String,
    pub ttl_ms: u64,
}

/// Bounded FIFO of pending toasts. When full, the oldest toast is dropped.
pub struct Notifier {
    queue: Mutex<VecDeque<Toast>>,
    capacity: usize,
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, kind: ToastKind, text: impl Into<String>) {
        let ttl_ms = match kind {
            ToastKind::Error => ERROR_TTL_MS,
            ToastKind::Success | ToastKind::Info => DEFAULT_TTL_MS,
        };
        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            text: text.into(),
            ttl_ms,
        };

        info!(toast_id = %toast.id, toast_kind = kind.as_str(), text = %toast.text, "Toast raised");

        let mut queue = self.queue.lock_recovered(LockSite::new(SOURCE, "push"));
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(toast);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.push(ToastKind::Success, text);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.push(ToastKind::Info, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push(ToastKind::Error, text);
    }

    /// Take every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.queue
            .lock_recovered(LockSite::new(SOURCE, "drain"))
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock_recovered(LockSite::new(SOURCE, "len")).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_toasts_in_order() {
        let notifier = Notifier::new();
        notifier.success("Added to cart");
        notifier.error("Could not load sellers");

        let toasts = notifier.drain();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[1].text, "Could not load sellers");
        assert_eq!(toasts[1].ttl_ms, ERROR_TTL_MS);
        assert!(notifier.is_empty());
    }

    #[test]
    fn oldest_toast_is_dropped_when_full() {
        let notifier = Notifier::with_capacity(2);
        notifier.info("one");
        notifier.info("two");
        notifier.info("three");

        let texts: Vec<_> = notifier.drain().into_iter().map(|toast| toast.text).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }
}
