// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Open Humans / Fitbit member storage
//!
//! This crate provides the records that link an Open Humans member to a
//! local account and to Fitbit credentials, keeps the Open Humans access
//! token fresh, and stores cached Fitbit API responses.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use error::AppError;
use services::{OpenHumansClient, OpenHumansService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub open_humans: OpenHumansService,
}

impl AppState {
    /// Connect the configured store and build the services on top of it.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let db = Database::connect(config).await?;
        let client = OpenHumansClient::new(config)?;
        let open_humans = OpenHumansService::new(client, db.clone());
        Ok(Self { db, open_humans })
    }
}
