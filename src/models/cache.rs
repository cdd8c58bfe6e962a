// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cached upstream responses for Fitbit data requests.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// A stored response, keyed by an opaque string (typically the request URL).
///
/// Keys are not unique: every write adds a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CacheItem {
    /// Assigned by the store on insert
    #[serde(default, alias = "_firestore_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(max = 2014))]
    pub key: String,
    /// Cached response body
    pub response: serde_json::Value,
    /// When the response was fetched; stored as a native Firestore
    /// timestamp so queries order by time, not by string
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub request_time: DateTime<Utc>,
}

impl CacheItem {
    pub fn new(key: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            id: None,
            key: key.into(),
            response,
            request_time: Utc::now(),
        }
    }

    /// True if the item is no older than `max_age` at `now`.
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.request_time <= max_age
    }
}

impl fmt::Display for CacheItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<CacheItem(key='{}')>", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_sets_request_time() {
        let before = Utc::now();
        let item = CacheItem::new("/1/user/-/activities/steps", json!({"steps": 100}));
        let after = Utc::now();

        assert!(item.id.is_none());
        assert!(item.request_time >= before && item.request_time <= after);
        assert_eq!(item.response["steps"], 100);
    }

    #[test]
    fn test_is_fresh() {
        let mut item = CacheItem::new("k", json!(null));
        let now = Utc::now();
        item.request_time = now - Duration::minutes(10);

        assert!(item.is_fresh(Duration::minutes(15), now));
        assert!(item.is_fresh(Duration::minutes(10), now));
        assert!(!item.is_fresh(Duration::minutes(5), now));
    }

    #[test]
    fn test_json_roundtrip_keeps_request_time() {
        let item = CacheItem::new("k", json!({"a": [1, 2]}));

        let encoded = serde_json::to_value(&item).unwrap();
        assert!(encoded["request_time"].is_string());
        assert!(encoded.get("id").is_none());

        let decoded: CacheItem = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn test_display_and_key_limit() {
        let item = CacheItem::new("https://api.fitbit.com/1/user/-/profile.json", json!({}));
        assert_eq!(
            item.to_string(),
            "<CacheItem(key='https://api.fitbit.com/1/user/-/profile.json')>"
        );

        let long = CacheItem::new("k".repeat(2015), json!({}));
        assert!(long.validate().is_err());
    }
}
