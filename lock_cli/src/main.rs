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

mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use distributed_lock::DistributedLock;
use kv_store::RedisClient;
use log::debug;

use crate::commands::LockCommands;
use crate::config::CliConfig;

/// Exit code when the store or the configuration fails
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[clap(author, version, about = "Distributed lock over Redis", long_about = None)]
struct Cli {
    /// Configuration file, defaults to lockctl.yaml when present
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Redis url, overrides REDIS_URL and the configuration file
    #[clap(long)]
    redis_url: Option<String>,

    #[clap(subcommand)]
    command: LockCommands,
}

fn main() {
    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            EXIT_ERROR
        },
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let env_file = dotenv::dotenv();
    let config = CliConfig::load(cli.config.as_deref())?;
    if let Err(e) = common_log::init_with_config(&config.logging) {
        eprintln!("warning: logging disabled: {}", e);
    }
    if let Ok(path) = env_file {
        debug!("load .env file: {}", path.display());
    }

    let redis_url = config.redis_url(cli.redis_url.as_deref())?;
    let store = RedisClient::open(&redis_url)?.with_key_prefix(config.redis.key_prefix.clone());
    let lock = DistributedLock::with_config(store, config.lock_config())?;

    let mut stdout = std::io::stdout();
    commands::execute(&lock, &cli.command, &mut stdout)
}
