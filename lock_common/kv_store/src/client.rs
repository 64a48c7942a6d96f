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

use log::{debug, info};
use redis::Client;

use crate::error::{Result, StoreError};

pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Redis backed key-value store.
///
/// Cloning is cheap, every operation opens its own connection from the underlying client.
#[derive(Clone, Debug)]
pub struct RedisClient {
    client: Client,
    key_prefix: String,
}

impl RedisClient {
    /// Creates a client for the given connection url, e.g. `redis://127.0.0.1:6379/`
    ///
    /// No connection is made until the first operation.
    pub fn open(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(StoreError::Connection)?;
        Ok(Self {
            client,
            key_prefix: String::new(),
        })
    }

    ///Creates a client from the REDIS_URL environment variable
    ///
    ///A `.env` file in the working directory is loaded first if present
    pub fn from_env() -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => info!("load .env file: {}", path.display()),
            Err(e) => debug!(".env not loaded: {}", e),
        }
        let redis_url = std::env::var(REDIS_URL_ENV)
            .map_err(|_| StoreError::Config(format!("{} environment variable not set", REDIS_URL_ENV)))?;
        Self::open(&redis_url)
    }

    /// Prefix prepended to every key handled by this client
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub(crate) fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    pub(crate) fn connection(&self) -> Result<redis::Connection> {
        self.client.get_connection().map_err(StoreError::Connection)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_open_does_not_connect() {
        let client = RedisClient::open("redis://127.0.0.1:1/");
        assert!(client.is_ok());
    }

    #[test]
    fn test_open_rejects_bad_url() {
        let result = RedisClient::open("not a url");
        assert!(matches!(result, Err(StoreError::Connection(_))));
    }

    #[test]
    fn test_key_prefix() {
        let client = RedisClient::open("redis://127.0.0.1/").unwrap();
        assert_eq!(client.full_key("orders"), "orders");

        let client = client.with_key_prefix("lock:");
        assert_eq!(client.key_prefix(), "lock:");
        assert_eq!(client.full_key("orders"), "lock:orders");
    }

    #[test]
    #[serial]
    fn test_from_env_missing_url() {
        let saved = std::env::var(REDIS_URL_ENV).ok();
        std::env::remove_var(REDIS_URL_ENV);

        let result = RedisClient::from_env();
        // a .env file in the working directory could still provide the url
        if std::env::var(REDIS_URL_ENV).is_err() {
            assert!(matches!(result, Err(StoreError::Config(_))));
        }

        if let Some(url) = saved {
            std::env::set_var(REDIS_URL_ENV, url);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_with_url() {
        let saved = std::env::var(REDIS_URL_ENV).ok();
        std::env::set_var(REDIS_URL_ENV, "redis://127.0.0.1:6379/");

        assert!(RedisClient::from_env().is_ok());

        match saved {
            Some(url) => std::env::set_var(REDIS_URL_ENV, url),
            None => std::env::remove_var(REDIS_URL_ENV),
        }
    }
}
