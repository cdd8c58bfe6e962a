//! Fitbit member model: OAuth2 credentials for the Fitbit API.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fitbit credentials, one-to-one with an [`OpenHumansMember`](super::OpenHumansMember).
///
/// Stored as returned by the Fitbit token exchange; nothing in this crate
/// refreshes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FitbitMember {
    /// Owning Open Humans member ID (also used as document ID)
    #[validate(length(min = 1, max = 16))]
    pub user: String,
    /// Fitbit user ID; unique across members when present
    #[validate(length(max = 255))]
    pub userid: Option<String>,
    #[validate(length(max = 255))]
    pub access_token: String,
    #[validate(length(max = 255))]
    pub refresh_token: String,
    /// Token lifetime as reported by Fitbit
    #[validate(length(max = 255))]
    pub expires_in: String,
    /// Space-separated granted scopes
    #[validate(length(max = 500))]
    pub scope: String,
    #[validate(length(max = 255))]
    pub token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_length_limit() {
        let mut member = FitbitMember {
            user: "12345678".to_string(),
            userid: Some("ABC12D".to_string()),
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in: "28800".to_string(),
            scope: "activity heartrate sleep".to_string(),
            token_type: "Bearer".to_string(),
        };
        assert!(member.validate().is_ok());

        member.scope = "s".repeat(501);
        assert!(member.validate().is_err());

        member.scope = "activity".to_string();
        member.userid = Some("u".repeat(256));
        assert!(member.validate().is_err());

        member.userid = None;
        assert!(member.validate().is_ok());
    }
}
