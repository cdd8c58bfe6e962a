// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token maintenance job.
//!
//! Walks every stored Open Humans member and refreshes access tokens that
//! are about to expire, so request handlers rarely have to wait on a
//! refresh themselves.

use chrono::Utc;
use oh_fitbit::{config::Config, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(store = ?config.store, "Starting Open Humans token maintenance");

    let state = AppState::from_config(&config).await?;

    let members = state.db.list_members().await?;
    let summary = state
        .open_humans
        .refresh_expiring(members, Utc::now())
        .await;

    tracing::info!(
        refreshed = summary.refreshed,
        rejected = summary.rejected,
        failed = summary.failed,
        "Token maintenance complete"
    );
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oh_fitbit=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
