//! Poison-tolerant lock acquisition.
//!
//! A panic while a guard is held must not take the storefront down with it:
//! the guard is recovered and the event is logged with the owning module and
//! operation so stale state can be traced back.

use std::sync::{LockResult, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

/// Call-site identity attached to recovery logs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LockSite {
    pub module: &'static str,
    pub op: &'static str,
}

impl LockSite {
    pub(crate) const fn new(module: &'static str, op: &'static str) -> Self {
        Self { module, op }
    }
}

fn recover<G>(result: LockResult<G>, site: LockSite, lock_kind: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            op = site.op,
            target_module = site.module,
            lock_kind,
            result = "poisoned_recovered",
            "Recovered from poisoned lock"
        );
        poisoned.into_inner()
    })
}

pub(crate) trait RecoverRwLock<T> {
    fn read_recovered(&self, site: LockSite) -> RwLockReadGuard<'_, T>;
    fn write_recovered(&self, site: LockSite) -> RwLockWriteGuard<'_, T>;
}

impl<T> RecoverRwLock<T> for RwLock<T> {
    fn read_recovered(&self, site: LockSite) -> RwLockReadGuard<'_, T> {
        recover(self.read(), site, "rwlock.read")
    }

    fn write_recovered(&self, site: LockSite) -> RwLockWriteGuard<'_, T> {
        recover(self.write(), site, "rwlock.write")
    }
}

pub(crate) trait RecoverMutex<T> {
    fn lock_recovered(&self, site: LockSite) -> MutexGuard<'_, T>;
}

impl<T> RecoverMutex<T> for Mutex<T> {
    fn lock_recovered(&self, site: LockSite) -> MutexGuard<'_, T> {
        recover(self.lock(), site, "mutex.lock")
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    const SITE: LockSite = LockSite::new("util::lock::tests", "poison");

    #[test]
    fn rwlock_survives_poisoning() {
        let lock = RwLock::new(1_u32);
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.write().expect("first write");
            panic!("poison rwlock");
        }));

        *lock.write_recovered(SITE) += 1;
        assert_eq!(*lock.read_recovered(SITE), 2);
    }

    #[test]
    fn mutex_survives_poisoning() {
        let lock = Mutex::new(Vec::<u8>::new());
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.lock().expect("first lock");
            panic!("poison mutex");
        }));

        lock.lock_recovered(SITE).push(7);
        assert_eq!(lock.lock_recovered(SITE).as_slice(), &[7]);
    }
}
