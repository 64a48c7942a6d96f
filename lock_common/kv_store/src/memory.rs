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

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::store::{CompareAndDelete, KeyValueStore};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process store with per-key expiry.
///
/// Only coordinates callers sharing the same instance, e.g. threads of one process.
/// Expired entries are treated as absent and purged on every insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool> {
        if ttl_secs == 0 {
            return Err(StoreError::InvalidArgument("ttl must be positive".to_string()));
        }
        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(ttl_secs))
            .ok_or_else(|| StoreError::InvalidArgument(format!("ttl too large: {}s", ttl_secs)))?;
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self.entries.lock().remove(key).is_some_and(|e| e.is_live(now)))
    }

    fn compare_and_delete(&self, key: &str, expected: &str) -> Result<CompareAndDelete> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let outcome = match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                if entry.value == expected {
                    CompareAndDelete::Deleted
                } else {
                    CompareAndDelete::Mismatch
                }
            }
            _ => CompareAndDelete::Absent,
        };
        if outcome != CompareAndDelete::Mismatch {
            entries.remove(key);
        }
        Ok(outcome)
    }

    fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let now = Instant::now();
        let entries = self.entries.lock();
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| {
                let remaining = e.expires_at.duration_since(now);
                ((remaining.as_millis() + 500) / 1000) as u64
            }))
    }
}
