/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::thread;
use std::time::Duration;

use kv_store::{CompareAndDelete, KeyValueStore};
use log::{debug, info, warn};

use super::config::{AcquireOptions, LockConfig};
use super::error::{DistributedLockError, Result};
use super::guard::LockGuard;

/// Outcome of a release attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Nothing was held under the key
    NotHeld,
    /// The key is held with another token and was left untouched
    NotOwner,
    /// The key held the caller's token and was deleted
    Released,
}

impl ReleaseOutcome {
    /// `false` only when the lock belongs to someone else
    pub fn is_success(&self) -> bool {
        !matches!(self, ReleaseOutcome::NotOwner)
    }
}

impl From<CompareAndDelete> for ReleaseOutcome {
    fn from(value: CompareAndDelete) -> Self {
        match value {
            CompareAndDelete::Absent => ReleaseOutcome::NotHeld,
            CompareAndDelete::Mismatch => ReleaseOutcome::NotOwner,
            CompareAndDelete::Deleted => ReleaseOutcome::Released,
        }
    }
}

/// Distributed lock over a shared key-value store.
///
/// The lock keeps no state of its own: a key present in the store is a held lock,
/// its value is the holder's token. The store's conditional set is the only arbiter
/// between contenders, so one instance may be shared by any number of threads and
/// processes.
#[derive(Debug, Clone)]
pub struct DistributedLock<S> {
    store: S,
    config: LockConfig,
}

impl<S: KeyValueStore> DistributedLock<S> {
    /// Create a lock with the default configuration
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: LockConfig::default(),
        }
    }

    /// Create a lock with a custom configuration
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If the configuration holds zero durations.
    pub fn with_config(store: S, config: LockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Acquire the lock
    ///
    /// # Arguments
    ///
    /// * `key` - Lock key name
    /// * `token` - Lock value, used to identify the lock owner
    /// * `max_wait_secs` - How long to keep retrying (seconds), also used as the lease.
    ///   Zero means a single attempt with the default maximum hold as lease.
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` once the lock is held, `Ok(false)` if it stayed busy
    /// for the whole wait budget.
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If `key` is empty.
    /// * `DistributedLockError::Store` - If the store fails during any attempt.
    pub fn acquire(&self, key: &str, token: &str, max_wait_secs: u64) -> Result<bool> {
        self.acquire_with(key, token, &AcquireOptions::wait_secs(max_wait_secs))
    }

    /// Acquire the lock with explicit options
    ///
    /// The first attempt is made immediately. While the key is held elsewhere the
    /// attempt is repeated every `poll_interval` until the accumulated wait reaches
    /// `max_wait`, so the last attempt may happen up to one interval late.
    /// A set cancel flag stops the polling, no attempt is made once it is observed.
    pub fn acquire_with(&self, key: &str, token: &str, options: &AcquireOptions) -> Result<bool> {
        check_key(key)?;
        let lease_secs = options.lease_secs(&self.config)?;

        let mut acquired = self.store.set_if_absent(key, token, lease_secs)?;
        let mut waited = Duration::ZERO;
        let mut attempts = 1u32;
        while !acquired && waited < options.max_wait {
            if options.is_cancelled() {
                info!("Acquire of lock {} cancelled after {} attempts", key, attempts);
                return Ok(false);
            }
            thread::sleep(self.config.poll_interval);
            if options.is_cancelled() {
                info!("Acquire of lock {} cancelled after {} attempts", key, attempts);
                return Ok(false);
            }
            waited += self.config.poll_interval;
            attempts += 1;
            debug!("Lock {} busy, retrying (attempt {}, waited {:?})", key, attempts, waited);
            acquired = self.store.set_if_absent(key, token, lease_secs)?;
        }

        if acquired {
            info!("Acquired lock {} with lease {}s after {} attempts", key, lease_secs, attempts);
        } else {
            debug!("Failed to acquire lock {} after {} attempts", key, attempts);
        }
        Ok(acquired)
    }

    /// Acquire the lock and return a guard releasing it on drop
    ///
    /// Returns `Ok(None)` when the lock could not be obtained within the wait budget.
    pub fn try_guard(&self, key: &str, token: &str, max_wait_secs: u64) -> Result<Option<LockGuard<'_, S>>> {
        if self.acquire(key, token, max_wait_secs)? {
            Ok(Some(LockGuard::new(self, key, token)))
        } else {
            Ok(None)
        }
    }

    /// Release the lock
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` when the lock was released or was not held at all,
    /// `Ok(false)` when it is held with another token, in which case nothing is deleted.
    pub fn release(&self, key: &str, token: &str) -> Result<bool> {
        self.release_outcome(key, token).map(|outcome| outcome.is_success())
    }

    /// Release the lock and report which of the three release cases applied
    pub fn release_outcome(&self, key: &str, token: &str) -> Result<ReleaseOutcome> {
        check_key(key)?;
        let outcome = ReleaseOutcome::from(self.store.compare_and_delete(key, token)?);
        match outcome {
            ReleaseOutcome::Released => info!("Released lock {}", key),
            ReleaseOutcome::NotHeld => debug!("Lock {} was not held", key),
            ReleaseOutcome::NotOwner => warn!("Lock {} is held by another owner, not released", key),
        }
        Ok(outcome)
    }

    /// Token of the current holder, `None` when the lock is free
    pub fn owner(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.store.get(key)?)
    }

    /// Remaining lease of the current holder in seconds
    pub fn lease_remaining(&self, key: &str) -> Result<Option<u64>> {
        check_key(key)?;
        Ok(self.store.ttl(key)?)
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(DistributedLockError::InvalidArgument("lock key must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Instant;

    use kv_store::MemoryStore;

    use super::*;
    use crate::config::DEFAULT_MAX_HOLD_SECS;

    fn fast_lock() -> DistributedLock<MemoryStore> {
        let config = LockConfig {
            poll_interval: Duration::from_millis(50),
            ..LockConfig::default()
        };
        DistributedLock::with_config(MemoryStore::new(), config).unwrap()
    }

    #[test]
    fn test_acquire_uncontended() {
        let lock = DistributedLock::new(MemoryStore::new());
        assert!(lock.acquire("res", "A", 0).unwrap());
        assert_eq!(lock.owner("res").unwrap().as_deref(), Some("A"));
    }

    #[test]
    fn test_zero_wait_uses_default_hold() {
        let lock = DistributedLock::new(MemoryStore::new());
        lock.acquire("res", "A", 0).unwrap();
        let ttl = lock.lease_remaining("res").unwrap().unwrap();
        assert!(ttl > 295 && ttl <= DEFAULT_MAX_HOLD_SECS, "ttl was {}", ttl);
    }

    #[test]
    fn test_wait_is_used_as_lease() {
        let lock = DistributedLock::new(MemoryStore::new());
        assert!(lock.acquire("res", "A", 7).unwrap());
        let ttl = lock.lease_remaining("res").unwrap().unwrap();
        assert!(ttl > 5 && ttl <= 7, "ttl was {}", ttl);
    }

    #[test]
    fn test_zero_wait_single_attempt() {
        let lock = DistributedLock::new(MemoryStore::new());
        assert!(lock.acquire("res", "A", 0).unwrap());

        let start = Instant::now();
        assert!(!lock.acquire("res", "B", 0).unwrap());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_empty_key_rejected() {
        let lock = DistributedLock::new(MemoryStore::new());
        assert!(matches!(lock.acquire("", "A", 0), Err(DistributedLockError::InvalidArgument(_))));
        assert!(matches!(lock.release("", "A"), Err(DistributedLockError::InvalidArgument(_))));
        assert!(lock.store().is_empty());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = LockConfig {
            poll_interval: Duration::ZERO,
            ..LockConfig::default()
        };
        assert!(DistributedLock::with_config(MemoryStore::new(), config).is_err());
    }

    #[test]
    fn test_release_outcomes() {
        let lock = fast_lock();
        assert_eq!(lock.release_outcome("res", "A").unwrap(), ReleaseOutcome::NotHeld);

        lock.acquire("res", "A", 0).unwrap();
        assert_eq!(lock.release_outcome("res", "B").unwrap(), ReleaseOutcome::NotOwner);
        assert_eq!(lock.owner("res").unwrap().as_deref(), Some("A"));

        assert_eq!(lock.release_outcome("res", "A").unwrap(), ReleaseOutcome::Released);
        assert_eq!(lock.owner("res").unwrap(), None);
    }

    #[test]
    fn test_cancelled_wait_returns_false() {
        let lock = fast_lock();
        lock.acquire("res", "A", 0).unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let options = AcquireOptions::wait_secs(30).with_cancel(cancel);
        let start = Instant::now();
        assert!(!lock.acquire_with("res", "B", &options).unwrap());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_cancel_during_pause_skips_next_attempt() {
        let config = LockConfig {
            poll_interval: Duration::from_millis(300),
            ..LockConfig::default()
        };
        let lock = DistributedLock::with_config(Arc::new(MemoryStore::new()), config).unwrap();
        assert!(lock.acquire("res", "A", 0).unwrap());

        let cancel = Arc::new(AtomicBool::new(false));
        let options = AcquireOptions::wait_secs(5).with_cancel(Arc::clone(&cancel));
        let waiter = lock.clone();
        let handle = std::thread::spawn(move || waiter.acquire_with("res", "B", &options).unwrap());

        // waiter is inside its first pause: free the key and cancel
        std::thread::sleep(Duration::from_millis(100));
        assert!(lock.release("res", "A").unwrap());
        cancel.store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(!handle.join().unwrap());
        assert_eq!(lock.owner("res").unwrap(), None);
    }

    #[test]
    fn test_unbounded_wait_is_error_not_panic() {
        let lock = DistributedLock::new(MemoryStore::new());
        assert!(matches!(lock.acquire("res", "A", u64::MAX), Err(DistributedLockError::Store(_))));
        assert_eq!(lock.owner("res").unwrap(), None);
    }

    #[test]
    fn test_waiter_gets_lock_after_release() {
        let config = LockConfig {
            poll_interval: Duration::from_millis(50),
            ..LockConfig::default()
        };
        let lock = DistributedLock::with_config(Arc::new(MemoryStore::new()), config).unwrap();
        assert!(lock.acquire("res", "A", 0).unwrap());

        let waiter = lock.clone();
        let handle = std::thread::spawn(move || waiter.acquire("res", "B", 2).unwrap());
        std::thread::sleep(Duration::from_millis(200));
        assert!(lock.release("res", "A").unwrap());

        assert!(handle.join().unwrap());
        assert_eq!(lock.owner("res").unwrap().as_deref(), Some("B"));
    }
}
