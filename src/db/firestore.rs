// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides storage primitives for:
//! - Users (local accounts, keyed by username)
//! - Open Humans members (keyed by `oh_id`)
//! - Fitbit members (keyed by owning `oh_id`)
//! - Cache items (auto-generated document IDs)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{CacheItem, FitbitMember, OpenHumansMember, User};
use firestore::errors::FirestoreError;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore-backed store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(username)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user document; fails if the document already exists.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let result: Result<User, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.username)
            .object(user)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(AppError::Conflict(format!(
                "Username {} already exists",
                user.username
            ))),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    // ─── Open Humans Member Operations ───────────────────────────

    pub async fn get_member(&self, oh_id: &str) -> Result<Option<OpenHumansMember>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::OPENHUMANS_MEMBERS)
            .obj()
            .one(oh_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn save_member(&self, member: &OpenHumansMember) -> Result<(), AppError> {
        let _: OpenHumansMember = self
            .client
            .fluent()
            .update()
            .in_col(collections::OPENHUMANS_MEMBERS)
            .document_id(&member.oh_id)
            .object(member)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn list_members(&self) -> Result<Vec<OpenHumansMember>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::OPENHUMANS_MEMBERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a member, its Fitbit member and its user in one transaction.
    pub async fn delete_member_cascade(&self, member: &OpenHumansMember) -> Result<(), AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let deletions = [
            (collections::FITBIT_MEMBERS, member.oh_id.as_str()),
            (collections::OPENHUMANS_MEMBERS, member.oh_id.as_str()),
            (collections::USERS, member.user.as_str()),
        ];

        for (collection, doc_id) in deletions {
            self.client
                .fluent()
                .delete()
                .from(collection)
                .document_id(doc_id)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add deletion to transaction for {}: {}",
                        collection, e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit member deletion: {}", e)))?;
        Ok(())
    }

    // ─── Fitbit Member Operations ────────────────────────────────

    pub async fn get_fitbit_member(&self, oh_id: &str) -> Result<Option<FitbitMember>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::FITBIT_MEMBERS)
            .obj()
            .one(oh_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn find_fitbit_member_by_userid(
        &self,
        userid: &str,
    ) -> Result<Option<FitbitMember>, AppError> {
        let userid = userid.to_string();
        let found: Vec<FitbitMember> = self
            .client
            .fluent()
            .select()
            .from(collections::FITBIT_MEMBERS)
            .filter(move |q| q.field("userid").eq(userid.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.into_iter().next())
    }

    pub async fn save_fitbit_member(&self, fitbit: &FitbitMember) -> Result<(), AppError> {
        let _: FitbitMember = self
            .client
            .fluent()
            .update()
            .in_col(collections::FITBIT_MEMBERS)
            .document_id(&fitbit.user)
            .object(fitbit)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_fitbit_member(&self, oh_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::FITBIT_MEMBERS)
            .document_id(oh_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Cache Operations ────────────────────────────────────────

    /// Insert with a Firestore-generated document ID.
    pub async fn insert_cache_item(&self, item: &CacheItem) -> Result<CacheItem, AppError> {
        self.client
            .fluent()
            .insert()
            .into(collections::CACHE_ITEMS)
            .generate_document_id()
            .object(item)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_cache_item(&self, id: &str) -> Result<Option<CacheItem>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::CACHE_ITEMS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn latest_cache_item(&self, key: &str) -> Result<Option<CacheItem>, AppError> {
        let key = key.to_string();
        let found: Vec<CacheItem> = self
            .client
            .fluent()
            .select()
            .from(collections::CACHE_ITEMS)
            .filter(move |q| q.field("key").eq(key.clone()))
            .order_by([(
                "request_time",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.into_iter().next())
    }

    pub async fn delete_cache_items(&self, key: &str) -> Result<usize, AppError> {
        let key_owned = key.to_string();
        let items: Vec<CacheItem> = self
            .client
            .fluent()
            .select()
            .from(collections::CACHE_ITEMS)
            .filter(move |q| q.field("key").eq(key_owned.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<String> = items.into_iter().filter_map(|item| item.id).collect();

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for id in chunk {
                self.client
                    .fluent()
                    .delete()
                    .from(collections::CACHE_ITEMS)
                    .document_id(id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add cache deletion to transaction: {}",
                            e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit cache deletion: {}", e))
            })?;
        }

        tracing::debug!(key, count = ids.len(), "Deleted cache items");
        Ok(ids.len())
    }
}
