// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Open Humans member model: OAuth2 credentials for the Open Humans platform.

use crate::time_utils::expiration_after;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Refresh once fewer than this many seconds of token life remain.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Suffix appended to the Open Humans ID to form the local username.
pub const USERNAME_SUFFIX: &str = "_openhumans";

/// Open Humans member stored in Firestore.
///
/// A local [`User`](super::User) is created for each member and deleted
/// along with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OpenHumansMember {
    /// Open Humans project member ID (also used as document ID)
    #[validate(length(min = 1, max = 16))]
    pub oh_id: String,
    /// Username of the owned local account
    pub user: String,
    #[validate(length(max = 256))]
    pub access_token: String,
    #[validate(length(max = 256))]
    pub refresh_token: String,
    /// When the access token expires
    pub token_expires: DateTime<Utc>,
}

impl OpenHumansMember {
    /// Absolute expiry for a token valid for `expires_in` seconds from now;
    /// `None` if that lies outside the representable range.
    pub fn get_expiration(expires_in: i64) -> Option<DateTime<Utc>> {
        expiration_after(Utc::now(), expires_in)
    }

    /// Base username for a member, before uniquification.
    pub fn username_base(oh_id: &str) -> String {
        format!("{}{}", oh_id, USERNAME_SUFFIX)
    }

    /// True if the access token is expired or has at most
    /// [`TOKEN_REFRESH_MARGIN_SECS`] left at `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= self.token_expires
    }

    /// Replace the token pair with freshly issued credentials.
    pub fn apply_tokens(
        &mut self,
        access_token: String,
        refresh_token: String,
        token_expires: DateTime<Utc>,
    ) {
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self.token_expires = token_expires;
    }
}

impl fmt::Display for OpenHumansMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<OpenHumansMember(oh_id='{}')>", self.oh_id)
    }
}
