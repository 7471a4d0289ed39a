// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use sakuracloud_dns_webhook::{
    config::StartupConfig,
    constants::TOKIO_WORKER_THREADS,
    sakuracloud::SakuraCloudClientFactory,
    server::run_webhook_server,
    solver::{SakuraCloudSolver, Solver},
};
use std::sync::Arc;
use tracing::{debug, info};

fn main() -> Result<()> {
    // Parse before starting the runtime so a missing GROUP_NAME fails fast
    let config = StartupConfig::parse();
    config.validate()?;

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("sakuracloud-webhook")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: StartupConfig) -> Result<()> {
    // Initialize logging with custom format
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Example: RUST_LOG=debug cargo run
    //
    // Respects RUST_LOG_FORMAT environment variable for output format
    // Example: RUST_LOG_FORMAT=json cargo run
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!(group = %config.group_name, "Starting SakuraCloud DNS webhook");
    debug!(?config, "Startup configuration");

    let zones = SakuraCloudClientFactory::new(
        &config.sakuracloud_api_root,
        config.sakuracloud_timeout(),
    )
    .context("Failed to create SakuraCloud client")?;

    let solvers: Vec<Box<dyn Solver>> = vec![Box::new(SakuraCloudSolver::new(Arc::new(zones)))];

    run_webhook_server(config, solvers).await
}
