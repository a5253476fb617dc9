//! In-memory account and refresh token stores.
//!
//! Used by tests and local tooling that should not need Postgres. Semantics
//! match the Postgres stores, including the single-winner delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::AuthError;
use super::store::{RefreshTokenStore, UserDirectory};
use crate::models::auth::{NewAccount, RefreshTokenRecord, Role, UserAccount};

/// Accounts keyed by normalized email.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    by_email: DashMap<String, UserAccount>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account as-is.
    pub fn insert(&self, account: UserAccount) {
        self.by_email.insert(account.email.clone(), account);
    }

    /// Remove an account by id.
    pub fn remove(&self, user_id: Uuid) {
        self.by_email.retain(|_, a| a.id != user_id);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError> {
        Ok(self.by_email.get(email).map(|a| a.value().clone()))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, AuthError> {
        Ok(self
            .by_email
            .iter()
            .find(|entry| entry.id == user_id)
            .map(|entry| entry.value().clone()))
    }

    async fn create_clinician(&self, account: NewAccount) -> Result<UserAccount, AuthError> {
        use dashmap::mapref::entry::Entry;

        match self.by_email.entry(account.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::EmailTaken),
            Entry::Vacant(slot) => {
                let created = UserAccount {
                    id: Uuid::now_v7(),
                    email: account.email,
                    name: account.name,
                    role: Role::Clinician,
                    clinician_id: Some(Uuid::now_v7()),
                    password_hash: account.password_hash,
                    created_at: Utc::now(),
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }
}

/// Refresh token records keyed by hash.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStore {
    records: DashMap<String, RefreshTokenRecord>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        self.records.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        Ok(self.records.get(token_hash).map(|r| r.value().clone()))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AuthError> {
        Ok(self.records.remove(token_hash).is_some())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let before = self.records.len();
        self.records.retain(|_, r| r.user_id != user_id);
        Ok((before - self.records.len()) as u64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_expired(now));
        Ok((before - self.records.len()) as u64)
    }
}
