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

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use common_log::LogConfig;
use distributed_lock::{LockConfig, DEFAULT_MAX_HOLD_SECS};
use kv_store::client::REDIS_URL_ENV;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "lockctl.yaml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub redis: RedisSection,
    pub lock: LockSection,
    pub logging: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RedisSection {
    pub url: Option<String>,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LockSection {
    pub poll_interval_ms: u64,
    pub default_max_hold_secs: u64,
}

impl Default for LockSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            default_max_hold_secs: DEFAULT_MAX_HOLD_SECS,
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            redis: RedisSection::default(),
            lock: LockSection::default(),
            // keep lock chatter off the terminal unless asked for
            logging: LogConfig {
                level: "warn".to_string(),
                ..LogConfig::default()
            },
        }
    }
}

impl CliConfig {
    /// Load the configuration file
    ///
    /// An explicit path must exist. Without one, `lockctl.yaml` in the working
    /// directory is used when present, otherwise the defaults apply.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Redis url by precedence: command line, REDIS_URL, config file
    pub fn redis_url(&self, cli_override: Option<&str>) -> anyhow::Result<String> {
        if let Some(url) = cli_override {
            return Ok(url.to_string());
        }
        if let Ok(url) = std::env::var(REDIS_URL_ENV) {
            return Ok(url);
        }
        match &self.redis.url {
            Some(url) => Ok(url.clone()),
            None => bail!("no redis url, pass --redis-url, set {} or configure redis.url", REDIS_URL_ENV),
        }
    }

    pub fn lock_config(&self) -> LockConfig {
        LockConfig {
            poll_interval: Duration::from_millis(self.lock.poll_interval_ms),
            default_max_hold_secs: self.lock.default_max_hold_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse("").unwrap();
        assert_eq!(config.lock_config(), LockConfig::default());
        assert_eq!(config.logging.level, "warn");
        assert!(config.redis.url.is_none());
        assert!(config.redis.key_prefix.is_empty());
    }

    #[test]
    fn test_parse_sections() {
        let yaml = r#"
redis:
  url: redis://cache:6379/
  key_prefix: "lock:"
lock:
  poll_interval_ms: 200
logging:
  level: debug
"#;
        let config = CliConfig::parse(yaml).unwrap();
        assert_eq!(config.redis.url.as_deref(), Some("redis://cache:6379/"));
        assert_eq!(config.redis.key_prefix, "lock:");
        let lock_config = config.lock_config();
        assert_eq!(lock_config.poll_interval, Duration::from_millis(200));
        assert_eq!(lock_config.default_max_hold_secs, 300);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.console);
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(CliConfig::parse("lock:\n  poll_interval_ms: soon\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lock:\n  default_max_hold_secs: 60").unwrap();
        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.lock.default_max_hold_secs, 60);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    #[serial]
    fn test_redis_url_precedence() {
        let saved = std::env::var(REDIS_URL_ENV).ok();
        let config = CliConfig::parse("redis:\n  url: redis://file/\n").unwrap();

        std::env::remove_var(REDIS_URL_ENV);
        assert_eq!(config.redis_url(None).unwrap(), "redis://file/");

        std::env::set_var(REDIS_URL_ENV, "redis://env/");
        assert_eq!(config.redis_url(None).unwrap(), "redis://env/");
        assert_eq!(config.redis_url(Some("redis://flag/")).unwrap(), "redis://flag/");

        std::env::remove_var(REDIS_URL_ENV);
        assert!(CliConfig::default().redis_url(None).is_err());

        if let Some(url) = saved {
            std::env::set_var(REDIS_URL_ENV, url);
        }
    }
}
