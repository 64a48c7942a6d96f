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

use std::sync::Arc;

use crate::error::Result;

/// Result of a conditional delete against a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareAndDelete {
    /// The key did not exist
    Absent,
    /// The key exists but holds another value, nothing was deleted
    Mismatch,
    /// The key held the expected value and was deleted
    Deleted,
}

/// Minimal key-value capability set consumed by the distributed lock.
///
/// Every operation is a single-key operation executed atomically by the backend.
/// Implementations must be shareable across threads.
pub trait KeyValueStore: Send + Sync {
    /// Creates `key` with `value` and an expiry of `ttl_secs` only if `key` does not exist.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to create.
    /// * `value` - The value to store.
    /// * `ttl_secs` - Expiry in seconds, must be positive.
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` when the write happened, `Ok(false)` when the key already exists.
    ///
    /// # Errors
    ///
    /// * `StoreError::InvalidArgument` - If `ttl_secs` is zero.
    /// * `StoreError::Connection` - If the backend cannot be reached.
    fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool>;

    /// Gets the current value of `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Removes `key`, returning whether something was removed. Idempotent.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Deletes `key` only when it currently holds `expected`.
    ///
    /// The default is a plain read followed by a delete, which is not atomic.
    /// Backends with server-side scripting should override it.
    fn compare_and_delete(&self, key: &str, expected: &str) -> Result<CompareAndDelete> {
        match self.get(key)? {
            None => Ok(CompareAndDelete::Absent),
            Some(current) if current != expected => Ok(CompareAndDelete::Mismatch),
            Some(_) => {
                self.delete(key)?;
                Ok(CompareAndDelete::Deleted)
            }
        }
    }

    /// Remaining time to live of `key` in seconds, `None` if absent or without expiry.
    fn ttl(&self, _key: &str) -> Result<Option<u64>> {
        Ok(None)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool> {
        (**self).set_if_absent(key, value, ttl_secs)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn compare_and_delete(&self, key: &str, expected: &str) -> Result<CompareAndDelete> {
        (**self).compare_and_delete(key, expected)
    }

    fn ttl(&self, key: &str) -> Result<Option<u64>> {
        (**self).ttl(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool> {
        (**self).set_if_absent(key, value, ttl_secs)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn compare_and_delete(&self, key: &str, expected: &str) -> Result<CompareAndDelete> {
        (**self).compare_and_delete(key, expected)
    }

    fn ttl(&self, key: &str) -> Result<Option<u64>> {
        (**self).ttl(key)
    }
}
