//! Credential validation and session issuance.
//!
//! Refresh tokens are single-use: every successful refresh deletes the
//! consumed record and stores a new one. Rotation is delete-then-insert
//! without a transaction, so a failure between the two loses the session but
//! can never leave two valid tokens behind.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AuthError;
use super::jwt::{ACCESS_TOKEN_EXPIRY_SECS, JwtKeys};
use super::password::{hash_password, verify_against_dummy, verify_password};
use super::refresh::{self, hash_refresh_token};
use super::store::{RefreshTokenStore, UserDirectory};
use super::normalize_email;
use crate::models::auth::{NewAccount, UserAccount, UserView};

/// Tokens and user view returned by login, registration and refresh.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserView,
}

/// Input for self-service clinician registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub specialty: Option<String>,
    pub default_session_price_cents: i64,
}

/// Authentication service. Cheap to clone.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    tokens: Arc<dyn RefreshTokenStore>,
    keys: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        tokens: Arc<dyn RefreshTokenStore>,
        keys: Arc<JwtKeys>,
    ) -> Self {
        Self {
            users,
            tokens,
            keys,
        }
    }

    /// Signing keys, for access token verification.
    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Check an email + password pair.
    ///
    /// Unknown account and wrong password produce the same
    /// [`AuthError::InvalidCredentials`].
    pub async fn validate_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserAccount, AuthError> {
        let email = normalize_email(email);
        let Some(account) = self.users.find_by_email(&email).await? else {
            verify_against_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        // A corrupt hash is treated like a wrong password.
        match verify_password(password, &account.password_hash) {
            Ok(true) => Ok(account),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                warn!(user_id = %account.id, "password hash check failed: {e}");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Issue an access token and a new refresh token for `account`.
    pub async fn login(&self, account: &UserAccount) -> Result<SessionTokens, AuthError> {
        let tokens = self.issue_session(account).await?;
        info!(user_id = %account.id, "user logged in");
        Ok(tokens)
    }

    /// Create a clinician account and log it in.
    pub async fn register(&self, registration: Registration) -> Result<SessionTokens, AuthError> {
        let email = normalize_email(&registration.email);
        let password_hash = hash_password(&registration.password)?;
        let account = self
            .users
            .create_clinician(NewAccount {
                email,
                name: registration.name.trim().to_string(),
                password_hash,
                specialty: registration.specialty,
                default_session_price_cents: registration.default_session_price_cents,
            })
            .await?;
        info!(user_id = %account.id, "clinician registered");
        self.issue_session(&account).await
    }

    /// Exchange a refresh token for a new token pair (single-use rotation).
    pub async fn refresh_access_token(
        &self,
        raw_refresh_token: &str,
    ) -> Result<SessionTokens, AuthError> {
        let token_hash = hash_refresh_token(raw_refresh_token);

        let Some(record) = self.tokens.find_by_hash(&token_hash).await? else {
            debug!("refresh token not found");
            return Err(AuthError::InvalidToken);
        };

        if record.is_expired(Utc::now()) {
            self.tokens.delete_by_hash(&token_hash).await?;
            debug!(user_id = %record.user_id, "purged expired refresh token");
            return Err(AuthError::InvalidToken);
        }

        // Losing this race means another request already rotated the token.
        if !self.tokens.delete_by_hash(&token_hash).await? {
            warn!(user_id = %record.user_id, "refresh token consumed concurrently");
            return Err(AuthError::InvalidToken);
        }

        let account = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.issue_session(&account).await
    }

    /// Revoke a single refresh token. Idempotent.
    pub async fn revoke_refresh_token(&self, raw_refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = hash_refresh_token(raw_refresh_token);
        self.tokens.delete_by_hash(&token_hash).await?;
        Ok(())
    }

    /// Revoke every refresh token of a user (logout everywhere).
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let removed = self.tokens.delete_for_user(user_id).await?;
        info!(user_id = %user_id, removed, "revoked all sessions");
        Ok(removed)
    }

    /// Delete every expired refresh token.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        self.tokens.purge_expired(Utc::now()).await
    }

    /// Look up the current account for an authenticated request.
    pub async fn current_user(&self, user_id: Uuid) -> Result<Option<UserView>, AuthError> {
        Ok(self.users.find_by_id(user_id).await?.map(|a| a.view()))
    }

    async fn issue_session(&self, account: &UserAccount) -> Result<SessionTokens, AuthError> {
        let access_token = self.keys.issue(account)?;
        let issued = refresh::mint(account.id, Utc::now());
        self.tokens.insert(issued.record).await?;
        Ok(SessionTokens {
            access_token,
            refresh_token: issued.raw,
            expires_in: ACCESS_TOKEN_EXPIRY_SECS,
            user: account.view(),
        })
    }
}
