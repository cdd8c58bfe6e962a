// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Open Humans client credentials are read once at startup and handed to
//! the services that need them.

use std::env;

/// Default Open Humans OAuth2 token endpoint.
pub const OH_TOKEN_URL: &str = "https://www.openhumans.org/oauth2/token/";

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (or its emulator).
    Firestore,
    /// Process-local maps; contents are lost on exit.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                name: "OH_FITBIT_STORE",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Open Humans OAuth client ID
    pub oh_client_id: String,
    /// Open Humans OAuth client secret
    pub oh_client_secret: String,
    /// Token endpoint used for refresh requests
    pub oh_token_url: String,
    /// Timeout for outbound HTTP requests, in seconds
    pub http_timeout_secs: u64,
    /// Storage backend
    pub store: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            oh_client_id: "test_client_id".to_string(),
            oh_client_secret: "test_secret".to_string(),
            oh_token_url: OH_TOKEN_URL.to_string(),
            http_timeout_secs: 30,
            store: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing client credentials default to the empty string; the token
    /// endpoint will then reject refreshes, which `get_access_token`
    /// tolerates.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let http_timeout_secs = match env::var("OH_HTTP_TIMEOUT_SECS") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "OH_HTTP_TIMEOUT_SECS",
                value: v,
            })?,
            Err(_) => 30,
        };

        let store = match env::var("OH_FITBIT_STORE") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        Ok(Self {
            oh_client_id: env::var("OH_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            oh_client_secret: env::var("OH_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            oh_token_url: env::var("OH_TOKEN_URL").unwrap_or_else(|_| OH_TOKEN_URL.to_string()),
            http_timeout_secs,
            store,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
