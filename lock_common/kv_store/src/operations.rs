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

use log::debug;
use redis::Commands;

use crate::client::RedisClient;
use crate::error::{Result, StoreError};
use crate::scripts::COMPARE_AND_DELETE;
use crate::store::{CompareAndDelete, KeyValueStore};

impl KeyValueStore for RedisClient {
    /// Sets a key in Redis with an expiry if it does not already exist.
    ///
    /// Issued as a single `SET key value NX EX ttl` so the key can never be
    /// left behind without an expiry.
    ///
    /// # Errors
    ///
    /// * `StoreError::InvalidArgument` - If `ttl_secs` is zero.
    /// * `StoreError::Connection` - If there is an error talking to Redis.
    fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool> {
        if ttl_secs == 0 {
            return Err(StoreError::InvalidArgument("ttl must be positive".to_string()));
        }
        let mut conn = self.connection()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.full_key(key))
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query(&mut conn)?;
        debug!("SET NX {} ttl {}s -> {:?}", key, ttl_secs, reply);
        Ok(reply.is_some())
    }

    /// Gets the value for a given key from Redis, `None` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = conn.get(self.full_key(key))?;
        Ok(value)
    }

    /// Deletes a key from Redis, returning whether it existed.
    fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        let removed: i64 = conn.del(self.full_key(key))?;
        Ok(removed > 0)
    }

    /// Deletes the key only when it holds `expected`, checked and deleted in one script call.
    fn compare_and_delete(&self, key: &str, expected: &str) -> Result<CompareAndDelete> {
        let mut conn = self.connection()?;
        let result: i64 = redis::Script::new(COMPARE_AND_DELETE)
            .key(self.full_key(key))
            .arg(expected)
            .invoke(&mut conn)?;
        match result {
            -1 => Ok(CompareAndDelete::Absent),
            0 => Ok(CompareAndDelete::Mismatch),
            1 => Ok(CompareAndDelete::Deleted),
            other => Err(StoreError::Operation(format!("unexpected compare-and-delete reply: {}", other))),
        }
    }

    /// Gets the remaining time to live for a key in seconds.
    ///
    /// Redis answers -2 for a missing key and -1 for a key without expiry, both map to `None`.
    fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let mut conn = self.connection()?;
        let ttl: i64 = conn.ttl(self.full_key(key))?;
        if ttl >= 0 {
            Ok(Some(ttl as u64))
        } else {
            Ok(None)
        }
    }
}
