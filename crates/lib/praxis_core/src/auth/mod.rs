//! Authentication and session management.
//!
//! Provides password hashing, JWT access tokens, rotating refresh tokens and
//! the [`service::AuthService`] that ties them to the account and token
//! stores.

pub mod jwt;
pub mod memory;
pub mod password;
pub mod queries;
pub mod refresh;
pub mod service;
pub mod store;

use thiserror::Error;

/// Authentication errors.
///
/// `InvalidCredentials` and `InvalidToken` are deliberately coarse: callers
/// must not learn which factor failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired session")]
    InvalidToken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Normalize an email for lookup and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Dr.Smith@Clinic.ORG \n"), "dr.smith@clinic.org");
    }
}
