// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk — image thresholding and watershed segmentation over HTTP
//
// Entry point. Initialises logging, loads configuration, prepares the upload
// directory, and serves the router until Ctrl-C.

mod error;
mod pages;
mod routes;
mod services;
mod state;

use std::process::ExitCode;

use bildwerk_core::config::CONFIG_FILE;
use bildwerk_core::error::Result;
use bildwerk_core::AppConfig;
use tracing::{error, info};

use state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Bildwerk stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load_or_default(CONFIG_FILE)?;
    config.validate()?;

    let state = AppState::new(config);
    state.store.ensure_root()?;

    let addr = state.config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %addr,
        upload_dir = %state.store.root().display(),
        "Bildwerk listening"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Bildwerk shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
