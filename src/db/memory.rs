// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.
//!
//! Used for tests and local runs without Firestore. Mirrors the Firestore
//! store's document layout: one map per collection, keyed by document ID.

use crate::error::AppError;
use crate::models::{CacheItem, FitbitMember, OpenHumansMember, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Collections {
    users: DashMap<String, User>,
    members: DashMap<String, OpenHumansMember>,
    fitbit_members: DashMap<String, FitbitMember>,
    cache_items: DashMap<u64, CacheItem>,
    next_cache_id: AtomicU64,
}

/// In-memory store; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Collections>,
}

impl MemoryStore {
    // ─── User Operations ─────────────────────────────────────────

    pub fn get_user(&self, username: &str) -> Option<User> {
        self.inner.users.get(username).map(|u| u.clone())
    }

    pub fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.inner.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Username {} already exists",
                user.username
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    // ─── Open Humans Member Operations ───────────────────────────

    pub fn get_member(&self, oh_id: &str) -> Option<OpenHumansMember> {
        self.inner.members.get(oh_id).map(|m| m.clone())
    }

    pub fn save_member(&self, member: &OpenHumansMember) {
        self.inner
            .members
            .insert(member.oh_id.clone(), member.clone());
    }

    pub fn list_members(&self) -> Vec<OpenHumansMember> {
        self.inner
            .members
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn delete_member_cascade(&self, member: &OpenHumansMember) {
        self.inner.fitbit_members.remove(&member.oh_id);
        self.inner.members.remove(&member.oh_id);
        self.inner.users.remove(&member.user);
    }

    // ─── Fitbit Member Operations ────────────────────────────────

    pub fn get_fitbit_member(&self, oh_id: &str) -> Option<FitbitMember> {
        self.inner.fitbit_members.get(oh_id).map(|f| f.clone())
    }

    pub fn find_fitbit_member_by_userid(&self, userid: &str) -> Option<FitbitMember> {
        self.inner
            .fitbit_members
            .iter()
            .find(|entry| entry.userid.as_deref() == Some(userid))
            .map(|entry| entry.value().clone())
    }

    pub fn save_fitbit_member(&self, fitbit: &FitbitMember) {
        self.inner
            .fitbit_members
            .insert(fitbit.user.clone(), fitbit.clone());
    }

    pub fn delete_fitbit_member(&self, oh_id: &str) {
        self.inner.fitbit_members.remove(oh_id);
    }

    // ─── Cache Operations ────────────────────────────────────────

    pub fn insert_cache_item(&self, item: &CacheItem) -> CacheItem {
        let id = self.inner.next_cache_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = CacheItem {
            id: Some(id.to_string()),
            ..item.clone()
        };
        self.inner.cache_items.insert(id, stored.clone());
        stored
    }

    pub fn get_cache_item(&self, id: &str) -> Option<CacheItem> {
        let id: u64 = id.parse().ok()?;
        self.inner.cache_items.get(&id).map(|c| c.clone())
    }

    /// Latest by `request_time`; ties go to the later insert.
    pub fn latest_cache_item(&self, key: &str) -> Option<CacheItem> {
        self.inner
            .cache_items
            .iter()
            .filter(|entry| entry.key == key)
            .max_by_key(|entry| (entry.request_time, *entry.key()))
            .map(|entry| entry.value().clone())
    }

    pub fn delete_cache_items(&self, key: &str) -> usize {
        let mut removed = 0;
        self.inner.cache_items.retain(|_, item| {
            let keep = item.key != key;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}
