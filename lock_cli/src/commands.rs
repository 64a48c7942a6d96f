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

use std::io::Write;
use std::process::Command;

use anyhow::Context;
use clap::Subcommand;
use distributed_lock::{DistributedLock, ReleaseOutcome};
use kv_store::KeyValueStore;
use log::{info, warn};

pub const EXIT_OK: i32 = 0;
pub const EXIT_REFUSED: i32 = 1;

#[derive(Subcommand, Debug)]
pub enum LockCommands {
    /// Acquire a lock, waiting up to --wait seconds
    Acquire {
        /// Lock key
        #[clap(short, long)]
        key: String,

        /// Ownership token, needed again to release
        #[clap(short, long)]
        token: String,

        /// Seconds to keep retrying, also the lease; 0 tries once with the default lease
        #[clap(short, long, default_value_t = 0)]
        wait: u64,
    },

    /// Release a lock held with the given token
    Release {
        /// Lock key
        #[clap(short, long)]
        key: String,

        /// Ownership token used when acquiring
        #[clap(short, long)]
        token: String,
    },

    /// Show the holder and remaining lease of a lock
    Status {
        /// Lock key
        #[clap(short, long)]
        key: String,
    },

    /// Run a command while holding the lock
    Exec {
        /// Lock key
        #[clap(short, long)]
        key: String,

        /// Ownership token
        #[clap(short, long)]
        token: String,

        /// Seconds to keep retrying, also the lease
        #[clap(short, long, default_value_t = 0)]
        wait: u64,

        /// Command and arguments, after `--`
        #[clap(last = true, required = true)]
        command: Vec<String>,
    },
}

/// Execute one command against the lock, returning the process exit code
pub fn execute<S: KeyValueStore>(
    lock: &DistributedLock<S>,
    command: &LockCommands,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    match command {
        LockCommands::Acquire { key, token, wait } => {
            if lock.acquire(key, token, *wait)? {
                writeln!(out, "acquired")?;
                Ok(EXIT_OK)
            } else {
                writeln!(out, "busy")?;
                Ok(EXIT_REFUSED)
            }
        },
        LockCommands::Release { key, token } => {
            let outcome = lock.release_outcome(key, token)?;
            writeln!(out, "{}", release_label(outcome))?;
            Ok(if outcome.is_success() { EXIT_OK } else { EXIT_REFUSED })
        },
        LockCommands::Status { key } => {
            match lock.owner(key)? {
                Some(owner) => {
                    let lease = lock
                        .lease_remaining(key)?
                        .map(|secs| format!("{}s", secs))
                        .unwrap_or_else(|| "unknown".to_string());
                    writeln!(out, "locked by {} (lease {})", owner, lease)?;
                },
                None => writeln!(out, "unlocked")?,
            }
            Ok(EXIT_OK)
        },
        LockCommands::Exec { key, token, wait, command } => {
            let guard = match lock.try_guard(key, token, *wait)? {
                Some(guard) => guard,
                None => {
                    writeln!(out, "busy")?;
                    return Ok(EXIT_REFUSED);
                },
            };
            let (program, args) = command.split_first().context("no command given")?;
            info!("Running {:?} under lock {}", command, key);
            let status = Command::new(program)
                .args(args)
                .status()
                .with_context(|| format!("failed to start {}", program))?;
            let outcome = guard.release()?;
            if outcome == ReleaseOutcome::NotOwner {
                warn!("Lock {} expired while {} was running", key, program);
            }
            Ok(status.code().unwrap_or(EXIT_REFUSED))
        },
    }
}

fn release_label(outcome: ReleaseOutcome) -> &'static str {
    match outcome {
        ReleaseOutcome::Released => "released",
        ReleaseOutcome::NotHeld => "not-held",
        ReleaseOutcome::NotOwner => "not-owner",
    }
}
