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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DistributedLockError, Result};

/// Lease used when the caller does not bound its wait, in seconds
pub const DEFAULT_MAX_HOLD_SECS: u64 = 300;

/// Pause between two acquisition attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lock behaviour settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// Pause between two acquisition attempts while the key is held elsewhere
    pub poll_interval: Duration,
    /// Lease applied when acquiring with a zero wait budget (seconds)
    pub default_max_hold_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_max_hold_secs: DEFAULT_MAX_HOLD_SECS,
        }
    }
}

impl LockConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(DistributedLockError::InvalidArgument("poll interval must be positive".to_string()));
        }
        if self.default_max_hold_secs == 0 {
            return Err(DistributedLockError::InvalidArgument("default max hold must be positive".to_string()));
        }
        Ok(())
    }
}

/// Per-call acquisition settings.
///
/// By default the lease equals the wait budget, or the configured default
/// maximum hold when the wait budget is zero.
#[derive(Debug, Clone, Default)]
pub struct AcquireOptions {
    /// How long to keep polling after the first failed attempt
    pub max_wait: Duration,
    /// Explicit lease in seconds, overrides the wait-derived lease
    pub lease_secs: Option<u64>,
    /// Polling stops once this flag is set
    pub cancel: Option<Arc<AtomicBool>>,
}

impl AcquireOptions {
    pub fn wait_secs(secs: u64) -> Self {
        Self {
            max_wait: Duration::from_secs(secs),
            ..Self::default()
        }
    }

    pub fn with_lease(mut self, lease_secs: u64) -> Self {
        self.lease_secs = Some(lease_secs);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Lease in seconds written with the lock key
    pub(crate) fn lease_secs(&self, config: &LockConfig) -> Result<u64> {
        let lease = match self.lease_secs {
            Some(lease) => lease,
            None if self.max_wait.is_zero() => config.default_max_hold_secs,
            // partial seconds round up so a short wait never yields a zero lease
            None => self.max_wait.as_secs() + u64::from(self.max_wait.subsec_nanos() > 0),
        };
        if lease == 0 {
            return Err(DistributedLockError::InvalidArgument("lease must be positive".to_string()));
        }
        Ok(lease)
    }
}
