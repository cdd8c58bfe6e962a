// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Open Humans OAuth2 client and member service.
//!
//! Handles:
//! - Member creation with a uniquely named local account
//! - Lazy access-token refresh when near expiry
//! - Persisting refreshed tokens

use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::models::OpenHumansMember;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// Token response from the Open Humans token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// What the token endpoint said about a refresh request.
#[derive(Debug, Clone)]
pub enum TokenRefresh {
    /// HTTP 200 with new credentials.
    Issued(TokenRefreshResponse),
    /// Any other status.
    Rejected { status: StatusCode, body: String },
}

/// Open Humans OAuth2 client.
#[derive(Clone)]
pub struct OpenHumansClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OpenHumansClient {
    /// Create a client with the configured credentials, endpoint and timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token_url: config.oh_token_url.clone(),
            client_id: config.oh_client_id.clone(),
            client_secret: config.oh_client_secret.clone(),
        })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// POST {token_url}
    /// Authorization: Basic {client_id}:{client_secret}
    /// grant_type=refresh_token&refresh_token={token}
    ///
    /// Only transport failures and unparseable 200 bodies are errors; a
    /// non-200 status comes back as [`TokenRefresh::Rejected`].
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRefresh, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::OpenHumansApi(format!("Token refresh request failed: {}", e))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(TokenRefresh::Rejected { status, body });
        }

        let tokens = response.json().await.map_err(|e| {
            AppError::OpenHumansApi(format!("Failed to parse token response: {}", e))
        })?;
        Ok(TokenRefresh::Issued(tokens))
    }
}

/// Result of [`OpenHumansService::refresh_tokens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens were stored on the member and persisted.
    Refreshed,
    /// The endpoint refused; the member is unchanged.
    Rejected { status: StatusCode },
}

/// Counts from [`OpenHumansService::refresh_expiring`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// High-level service for Open Humans members.
#[derive(Clone)]
pub struct OpenHumansService {
    client: OpenHumansClient,
    db: Database,
}

impl OpenHumansService {
    pub fn new(client: OpenHumansClient, db: Database) -> Self {
        Self { client, db }
    }

    /// Create a member for a newly authorized Open Humans user.
    ///
    /// Writes the local user (named `{oh_id}_openhumans`, suffixed with a
    /// number if taken) immediately. The returned member is NOT saved; the
    /// caller persists it with [`Database::save_member`].
    pub async fn create_member(
        &self,
        oh_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
    ) -> Result<OpenHumansMember, AppError> {
        let base = OpenHumansMember::username_base(oh_id);
        let token_expires = OpenHumansMember::get_expiration(expires_in).ok_or_else(|| {
            AppError::OpenHumansApi(format!("Token lifetime out of range: {}", expires_in))
        })?;

        let mut member = OpenHumansMember {
            oh_id: oh_id.to_string(),
            user: base.clone(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            token_expires,
        };
        member.validate()?;

        let user = self.db.create_user_unique(&base).await?;
        member.user = user.username;

        tracing::info!(oh_id, username = %member.user, "Created Open Humans member");
        Ok(member)
    }

    /// Return the member's access token, refreshing it first if it expires
    /// within a minute.
    ///
    /// A refresh the endpoint rejects is logged and otherwise ignored: the
    /// stored (possibly expired) token is returned.
    pub async fn get_access_token(
        &self,
        member: &mut OpenHumansMember,
    ) -> Result<String, AppError> {
        if member.needs_refresh(Utc::now()) {
            tracing::debug!(oh_id = %member.oh_id, "Access token near expiry, refreshing");
            self.refresh_tokens(member).await?;
        }
        Ok(member.access_token.clone())
    }

    /// Refresh the member's tokens unconditionally and persist them on success.
    pub async fn refresh_tokens(
        &self,
        member: &mut OpenHumansMember,
    ) -> Result<RefreshOutcome, AppError> {
        match self.client.refresh_token(&member.refresh_token).await? {
            TokenRefresh::Issued(tokens) => {
                let token_expires = OpenHumansMember::get_expiration(tokens.expires_in)
                    .ok_or_else(|| {
                        AppError::OpenHumansApi(format!(
                            "Token lifetime out of range: {}",
                            tokens.expires_in
                        ))
                    })?;
                member.apply_tokens(tokens.access_token, tokens.refresh_token, token_expires);
                self.db.save_member(member).await?;
                tracing::info!(
                    oh_id = %member.oh_id,
                    expires = %crate::time_utils::format_utc_rfc3339(member.token_expires),
                    "Open Humans token refreshed"
                );
                Ok(RefreshOutcome::Refreshed)
            }
            TokenRefresh::Rejected { status, body } => {
                tracing::warn!(
                    oh_id = %member.oh_id,
                    status = %status,
                    body = %body,
                    "Open Humans token refresh rejected, keeping stored tokens"
                );
                Ok(RefreshOutcome::Rejected { status })
            }
        }
    }

    /// Refresh every member whose token needs it at `now`, persisting the
    /// successes. Errors for one member are logged and counted, not returned.
    pub async fn refresh_expiring(
        &self,
        members: Vec<OpenHumansMember>,
        now: DateTime<Utc>,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for mut member in members.into_iter().filter(|m| m.needs_refresh(now)) {
            match self.refresh_tokens(&mut member).await {
                Ok(RefreshOutcome::Refreshed) => summary.refreshed += 1,
                Ok(RefreshOutcome::Rejected { .. }) => summary.rejected += 1,
                Err(e) => {
                    tracing::error!(oh_id = %member.oh_id, error = %e, "Token refresh failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
