// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Username uniquification and member creation.

use oh_fitbit::db::Database;
use oh_fitbit::error::AppError;
use oh_fitbit::models::User;
use std::collections::HashSet;

mod common;
use common::test_service;

#[tokio::test]
async fn test_unused_base_returned_unchanged() {
    let db = Database::in_memory();

    let name = db.make_unique_username("carol").await.unwrap();

    assert_eq!(name, "carol");
}

#[tokio::test]
async fn test_taken_names_get_next_suffix() {
    let db = Database::in_memory();
    for name in ["dave", "dave2", "dave3"] {
        db.insert_user(&User::new(name)).await.unwrap();
    }

    assert_eq!(db.make_unique_username("dave").await.unwrap(), "dave4");
}

#[tokio::test]
async fn test_suffix_starts_at_two() {
    let db = Database::in_memory();
    db.insert_user(&User::new("erin")).await.unwrap();

    assert_eq!(db.make_unique_username("erin").await.unwrap(), "erin2");
}

#[tokio::test]
async fn test_create_user_unique_matches_lookup() {
    let db = Database::in_memory();
    for name in ["frank", "frank2"] {
        db.insert_user(&User::new(name)).await.unwrap();
    }

    let expected = db.make_unique_username("frank").await.unwrap();
    let user = db.create_user_unique("frank").await.unwrap();

    assert_eq!(user.username, expected);
    assert!(db.user_exists("frank3").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_never_shares_a_name() {
    let db = Database::in_memory();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.create_user_unique("grace").await.unwrap().username })
        })
        .collect();

    let mut names = HashSet::new();
    for handle in handles {
        names.insert(handle.await.unwrap());
    }

    let expected: HashSet<String> = std::iter::once("grace".to_string())
        .chain((2..=10).map(|n| format!("grace{}", n)))
        .collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_create_member_uses_openhumans_username() {
    let (service, db) = test_service("http://127.0.0.1:9/unused");

    let member = service
        .create_member("abc123", "access", "refresh", 36000)
        .await
        .unwrap();

    assert_eq!(member.user, "abc123_openhumans");
    assert_eq!(member.oh_id, "abc123");
    assert_eq!(member.access_token, "access");
    assert!(db.user_exists("abc123_openhumans").await.unwrap());

    // The member itself is left for the caller to save.
    assert!(db.get_member("abc123").await.unwrap().is_none());
    db.save_member(&member).await.unwrap();
    assert_eq!(db.get_member("abc123").await.unwrap().unwrap(), member);
}

#[tokio::test]
async fn test_create_member_with_taken_username() {
    let (service, db) = test_service("http://127.0.0.1:9/unused");
    db.insert_user(&User::new("abc123_openhumans"))
        .await
        .unwrap();

    let member = service
        .create_member("abc123", "access", "refresh", 36000)
        .await
        .unwrap();

    assert_eq!(member.user, "abc123_openhumans2");
}

#[tokio::test]
async fn test_create_member_sets_expiry_from_now() {
    let (service, _db) = test_service("http://127.0.0.1:9/unused");
    let before = chrono::Utc::now();

    let member = service
        .create_member("exp42", "access", "refresh", 600)
        .await
        .unwrap();

    let offset = member.token_expires - before;
    assert!(offset >= chrono::Duration::seconds(600));
    assert!(offset < chrono::Duration::seconds(605));
}

#[tokio::test]
async fn test_create_member_rejects_long_id_without_writing_user() {
    let (service, db) = test_service("http://127.0.0.1:9/unused");
    let long_id = "x".repeat(17);

    let err = service
        .create_member(&long_id, "access", "refresh", 36000)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(!db
        .user_exists(&format!("{}_openhumans", long_id))
        .await
        .unwrap());
}
