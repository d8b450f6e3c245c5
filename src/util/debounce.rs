//! Trailing-edge debounce with an explicit cancel handle.
//!
//! Each call replaces the pending one; the callback fires once `delay` has
//! elapsed without a newer call. Dropping the debouncer cancels whatever is
//! pending, so nothing fires after its owner is gone.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::util::lock::{LockSite, RecoverMutex};

const SOURCE: &str = "util::debounce";

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct Debouncer<T> {
    delay: Duration,
    callback: Callback<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            callback: Arc::new(callback),
            pending: Mutex::new(None),
        }
    }

    /// Schedule `value`, superseding any call still waiting. Must run inside
    /// a tokio runtime.
    pub fn call(&self, value: T) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(value);
        });

        let previous = self
            .pending
            .lock_recovered(LockSite::new(SOURCE, "call"))
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop the pending call. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        match self
            .pending
            .lock_recovered(LockSite::new(SOURCE, "cancel"))
            .take()
        {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock_recovered(LockSite::new(SOURCE, "is_pending"))
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(task) = self
            .pending
            .lock_recovered(LockSite::new(SOURCE, "drop"))
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;

    fn recorder() -> (Arc<StdMutex<Vec<String>>>, impl Fn(String) + Send + Sync + 'static) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value| sink.lock().unwrap().push(value))
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_call_fires() {
        let (seen, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(300), callback);

        debouncer.call("s".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.call("sh".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.call("shoe".to_string());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["shoe".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (seen, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(300), callback);

        debouncer.call("lamp".to_string());
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_owner_releases_the_pending_call() {
        let (seen, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(300), callback);
        debouncer.call("chair".to_string());
        drop(debouncer);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
