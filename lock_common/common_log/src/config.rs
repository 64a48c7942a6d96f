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

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_console")]
    pub console: bool,
    #[serde(default)]
    pub file: Option<FileConfig>,
    #[serde(default)]
    pub loggers: Vec<LoggerConfig>,
}

/// Rolling log file, rolled into gzip archives once `max_file_size` is reached
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub path: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_max_archives")]
    pub max_archives: u32,
}

/// Level override for one module path prefix
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    pub target: String,
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_console() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_archives() -> u32 {
    5
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            console: default_console(),
            file: None,
            loggers: Vec::new(),
        }
    }
}

impl LogConfig {
    pub fn from_yaml(path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = std::fs::read_to_string(path.into())?;
        let config: LogConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_mapping() {
        let config: LogConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.level, "info");
        assert!(config.console);
        assert!(config.file.is_none());
        assert!(config.loggers.is_empty());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
level: warn
console: false
file:
  path: logs/lockctl.log
  max_archives: 3
loggers:
  - target: distributed_lock
    level: debug
"#;
        let config: LogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.level, "warn");
        assert!(!config.console);
        let file = config.file.as_ref().unwrap();
        assert_eq!(file.path, "logs/lockctl.log");
        assert_eq!(file.max_file_size, 10 * 1024 * 1024);
        assert_eq!(file.max_archives, 3);
        assert_eq!(config.loggers.len(), 1);
        assert_eq!(config.loggers[0].target, "distributed_lock");
        assert_eq!(config.loggers[0].level, "debug");
    }
}
