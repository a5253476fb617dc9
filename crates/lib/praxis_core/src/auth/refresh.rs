//! Refresh token generation and hashing.

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::auth::RefreshTokenRecord;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Length of the raw refresh token.
const REFRESH_TOKEN_LEN: usize = 64;

/// Generate a cryptographically random refresh token (64 alphanumeric chars).
pub fn generate_refresh_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a refresh token for storage (lowercase hex).
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A freshly minted token: the raw value for the client and the record to store.
pub struct IssuedRefreshToken {
    pub raw: String,
    pub record: RefreshTokenRecord,
}

/// Mint a new refresh token for `user_id`, valid for 7 days from `now`.
pub fn mint(user_id: Uuid, now: DateTime<Utc>) -> IssuedRefreshToken {
    let raw = generate_refresh_token();
    let record = RefreshTokenRecord {
        user_id,
        token_hash: hash_refresh_token(&raw),
        expires_at: now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
    };
    IssuedRefreshToken { raw, record }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_long_random_and_alphanumeric() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), REFRESH_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_sha256_hex() {
        // printf 'abc' | sha256sum
        assert_eq!(
            hash_refresh_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn minted_record_stores_only_the_hash() {
        let now = Utc::now();
        let user = Uuid::now_v7();
        let issued = mint(user, now);
        assert_eq!(issued.record.user_id, user);
        assert_eq!(issued.record.token_hash.len(), 64);
        assert_eq!(issued.record.token_hash, hash_refresh_token(&issued.raw));
        assert_ne!(issued.record.token_hash, issued.raw);
        assert_eq!(issued.record.expires_at, now + Duration::days(7));
        assert!(!issued.record.is_expired(now));
        assert!(issued.record.is_expired(now + Duration::days(7)));
    }
}
