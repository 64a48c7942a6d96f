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

use kv_store::KeyValueStore;
use log::{error, warn};

use super::error::Result;
use super::lock::{DistributedLock, ReleaseOutcome};

/// Held lock, released when dropped
#[derive(Debug)]
pub struct LockGuard<'a, S: KeyValueStore> {
    lock: &'a DistributedLock<S>,
    key: String,
    token: String,
    released: bool,
}

impl<'a, S: KeyValueStore> LockGuard<'a, S> {
    pub(crate) fn new(lock: &'a DistributedLock<S>, key: &str, token: &str) -> Self {
        Self {
            lock,
            key: key.to_string(),
            token: token.to_string(),
            released: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Release now and report the outcome instead of waiting for drop
    pub fn release(mut self) -> Result<ReleaseOutcome> {
        self.released = true;
        self.lock.release_outcome(&self.key, &self.token)
    }
}

impl<S: KeyValueStore> Drop for LockGuard<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.lock.release_outcome(&self.key, &self.token) {
            Ok(ReleaseOutcome::NotOwner) => {
                warn!("Lock {} lease expired and was taken over before release", self.key)
            }
            Ok(_) => {}
            Err(e) => error!("Failed to release lock {}: {}", self.key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use kv_store::MemoryStore;

    use crate::DistributedLock;

    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = DistributedLock::new(MemoryStore::new());
        {
            let guard = lock.try_guard("res", "A", 0).unwrap().unwrap();
            assert_eq!(guard.key(), "res");
            assert_eq!(guard.token(), "A");
            assert!(!lock.acquire("res", "B", 0).unwrap());
        }
        assert!(lock.acquire("res", "B", 0).unwrap());
    }

    #[test]
    fn test_guard_none_when_busy() {
        let lock = DistributedLock::new(MemoryStore::new());
        lock.acquire("res", "A", 0).unwrap();
        assert!(lock.try_guard("res", "B", 0).unwrap().is_none());
        assert_eq!(lock.owner("res").unwrap().as_deref(), Some("A"));
    }

    #[test]
    fn test_explicit_release() {
        let lock = DistributedLock::new(MemoryStore::new());
        let guard = lock.try_guard("res", "A", 0).unwrap().unwrap();
        assert_eq!(guard.release().unwrap(), ReleaseOutcome::Released);
        assert_eq!(lock.owner("res").unwrap(), None);
    }

    #[test]
    fn test_drop_leaves_foreign_lock_alone() {
        let lock = DistributedLock::new(MemoryStore::new());
        let guard = lock.try_guard("res", "A", 0).unwrap().unwrap();
        // simulate lease expiry followed by another holder
        lock.store().delete("res").unwrap();
        lock.acquire("res", "B", 0).unwrap();

        drop(guard);
        assert_eq!(lock.owner("res").unwrap().as_deref(), Some("B"));
    }
}
