//! Local user account model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local account created for each Open Humans member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Username (also used as document ID)
    pub username: String,
    /// When the account was created
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            date_joined: Utc::now(),
        }
    }
}

/// Candidate usernames for `base`, in the order they are tried:
/// `base`, `base2`, `base3`, ...
pub fn username_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((2u64..).map(move |n| format!("{}{}", base, n)))
}
