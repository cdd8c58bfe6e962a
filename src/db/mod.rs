// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Database`] is the typed facade used by the rest of the crate. It
//! validates records before writing them, enforces the cross-record rules
//! (unique usernames, unique Fitbit user IDs, cascading deletes) and
//! forwards storage primitives to either Firestore or an in-process store.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreStore;
pub use self::memory::MemoryStore;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::user::username_candidates;
use crate::models::{CacheItem, FitbitMember, OpenHumansMember, User};
use validator::Validate;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const OPENHUMANS_MEMBERS: &str = "openhumans_members";
    pub const FITBIT_MEMBERS: &str = "fitbit_members";
    pub const CACHE_ITEMS: &str = "cache_items";
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(MemoryStore),
}

/// Database handle; cheap to clone.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Connect to the backend selected by `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store {
            StoreBackend::Firestore => Self::firestore(&config.gcp_project_id).await,
            StoreBackend::Memory => Ok(Self::in_memory()),
        }
    }

    /// Connect to Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set).
    pub async fn firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreStore::new(project_id).await?),
        })
    }

    /// Create an empty in-process database.
    pub fn in_memory() -> Self {
        tracing::info!("Using in-memory store");
        Self {
            backend: Backend::Memory(MemoryStore::default()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by username.
    pub async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.get_user(username).await,
            Backend::Memory(s) => Ok(s.get_user(username)),
        }
    }

    /// True if a user with exactly this username exists.
    pub async fn user_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.get_user(username).await?.is_some())
    }

    /// Insert a new user, failing with [`AppError::Conflict`] if the
    /// username is taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.insert_user(user).await,
            Backend::Memory(s) => s.insert_user(user),
        }
    }

    /// Return `base` if no user has that name, else the first free
    /// `base2`, `base3`, ...
    ///
    /// The answer can be stale by the time the caller uses it; account
    /// creation goes through [`Database::create_user_unique`] instead.
    pub async fn make_unique_username(&self, base: &str) -> Result<String, AppError> {
        for candidate in username_candidates(base) {
            if !self.user_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "No free username for base {}",
            base
        )))
    }

    /// Create a user named after `base`, trying the same candidates as
    /// [`Database::make_unique_username`] but claiming each one with an
    /// atomic insert so concurrent callers never share a name.
    pub async fn create_user_unique(&self, base: &str) -> Result<User, AppError> {
        for candidate in username_candidates(base) {
            let user = User::new(candidate);
            match self.insert_user(&user).await {
                Ok(()) => {
                    tracing::debug!(username = %user.username, "Created user");
                    return Ok(user);
                }
                Err(e) if e.is_conflict() => {
                    tracing::debug!(username = %user.username, "Username taken, trying next");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "No free username for base {}",
            base
        )))
    }

    // ─── Open Humans Member Operations ───────────────────────────

    /// Get a member by Open Humans ID.
    pub async fn get_member(&self, oh_id: &str) -> Result<Option<OpenHumansMember>, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.get_member(oh_id).await,
            Backend::Memory(s) => Ok(s.get_member(oh_id)),
        }
    }

    /// Create or update a member.
    pub async fn save_member(&self, member: &OpenHumansMember) -> Result<(), AppError> {
        member.validate()?;
        match &self.backend {
            Backend::Firestore(s) => s.save_member(member).await,
            Backend::Memory(s) => {
                s.save_member(member);
                Ok(())
            }
        }
    }

    /// List all members.
    pub async fn list_members(&self) -> Result<Vec<OpenHumansMember>, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.list_members().await,
            Backend::Memory(s) => Ok(s.list_members()),
        }
    }

    /// Delete a member together with its Fitbit member and local user.
    ///
    /// Returns `false` if no such member existed.
    pub async fn delete_member(&self, oh_id: &str) -> Result<bool, AppError> {
        let Some(member) = self.get_member(oh_id).await? else {
            return Ok(false);
        };

        match &self.backend {
            Backend::Firestore(s) => s.delete_member_cascade(&member).await?,
            Backend::Memory(s) => s.delete_member_cascade(&member),
        }

        tracing::info!(oh_id, username = %member.user, "Deleted member and owned records");
        Ok(true)
    }

    // ─── Fitbit Member Operations ────────────────────────────────

    /// Get the Fitbit member owned by an Open Humans member.
    pub async fn get_fitbit_member(&self, oh_id: &str) -> Result<Option<FitbitMember>, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.get_fitbit_member(oh_id).await,
            Backend::Memory(s) => Ok(s.get_fitbit_member(oh_id)),
        }
    }

    /// Find a Fitbit member by Fitbit user ID.
    pub async fn find_fitbit_member_by_userid(
        &self,
        userid: &str,
    ) -> Result<Option<FitbitMember>, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.find_fitbit_member_by_userid(userid).await,
            Backend::Memory(s) => Ok(s.find_fitbit_member_by_userid(userid)),
        }
    }

    /// Create or update the Fitbit member for `fitbit.user`.
    ///
    /// Fails with [`AppError::NotFound`] if the owning Open Humans member
    /// does not exist and with [`AppError::Conflict`] if the Fitbit user ID
    /// is already linked to a different member.
    pub async fn save_fitbit_member(&self, fitbit: &FitbitMember) -> Result<(), AppError> {
        fitbit.validate()?;

        if self.get_member(&fitbit.user).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Open Humans member {}",
                fitbit.user
            )));
        }

        if let Some(userid) = fitbit.userid.as_deref() {
            if let Some(existing) = self.find_fitbit_member_by_userid(userid).await? {
                if existing.user != fitbit.user {
                    tracing::warn!(
                        userid,
                        oh_id = %fitbit.user,
                        linked_to = %existing.user,
                        "Fitbit user already linked to another member"
                    );
                    return Err(AppError::Conflict(format!(
                        "Fitbit user {} is already linked",
                        userid
                    )));
                }
            }
        }

        match &self.backend {
            Backend::Firestore(s) => s.save_fitbit_member(fitbit).await,
            Backend::Memory(s) => {
                s.save_fitbit_member(fitbit);
                Ok(())
            }
        }
    }

    /// Delete the Fitbit member owned by an Open Humans member.
    pub async fn delete_fitbit_member(&self, oh_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.delete_fitbit_member(oh_id).await,
            Backend::Memory(s) => {
                s.delete_fitbit_member(oh_id);
                Ok(())
            }
        }
    }

    // ─── Cache Operations ────────────────────────────────────────

    /// Store a cache item; returns it with its assigned `id`.
    pub async fn insert_cache_item(&self, item: &CacheItem) -> Result<CacheItem, AppError> {
        item.validate()?;
        match &self.backend {
            Backend::Firestore(s) => s.insert_cache_item(item).await,
            Backend::Memory(s) => Ok(s.insert_cache_item(item)),
        }
    }

    /// Get a cache item by its assigned ID.
    pub async fn get_cache_item(&self, id: &str) -> Result<Option<CacheItem>, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.get_cache_item(id).await,
            Backend::Memory(s) => Ok(s.get_cache_item(id)),
        }
    }

    /// Most recently fetched item for `key`, if any.
    pub async fn latest_cache_item(&self, key: &str) -> Result<Option<CacheItem>, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.latest_cache_item(key).await,
            Backend::Memory(s) => Ok(s.latest_cache_item(key)),
        }
    }

    /// Delete every item stored under `key`; returns how many were removed.
    pub async fn delete_cache_items(&self, key: &str) -> Result<usize, AppError> {
        match &self.backend {
            Backend::Firestore(s) => s.delete_cache_items(key).await,
            Backend::Memory(s) => Ok(s.delete_cache_items(key)),
        }
    }
}
