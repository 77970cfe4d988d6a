// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use resp_kv_rs::{
    cfg::{
        cli::{config_path_from_env, resolve_config_path},
        config::Config,
        logger::init_logger,
    },
    server::Server,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _logger_guard = init_logger("config/logger.yaml")?;

    // Load config
    let cfg = resolve_config_path(&config_path_from_env())
        .and_then(Config::load_from_file)
        .context("failed to resolve or load config")?;

    let server = Server::new(cfg);
    let addr = server.start().await?;
    info!("serving keyspace on {addr}");

    // Run until interrupted, then let the sessions unwind.
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();

    Ok(())
}
