//! Storage seams for accounts and refresh tokens.
//!
//! Postgres implementations live in [`super::queries`]; in-memory ones in
//! [`super::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{NewAccount, RefreshTokenRecord, UserAccount};

/// Account lookup and creation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find an account by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, AuthError>;

    /// Create a clinician account together with its clinician profile.
    ///
    /// Returns [`AuthError::EmailTaken`] if the email is already registered.
    async fn create_clinician(&self, account: NewAccount) -> Result<UserAccount, AuthError>;
}

/// Persistence for refresh token hashes.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), AuthError>;

    /// Find a record by hash, expired or not.
    async fn find_by_hash(&self, token_hash: &str)
    -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Delete a record by hash. Returns whether a record was removed.
    ///
    /// This is the serialization point for concurrent rotations: only one
    /// caller can observe `true` for a given hash.
    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AuthError>;

    /// Delete every record for a user. Returns the number removed.
    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, AuthError>;

    /// Delete every record with `expires_at <= now`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}
