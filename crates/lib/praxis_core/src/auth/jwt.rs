//! JWT access token generation and verification.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::AuthError;
use crate::models::auth::{AccessTokenClaims, UserAccount};

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// HS256 signing and verification keys, built once from the signing secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Generate a signed access token (HS256, 15 min expiry) for `account`.
    pub fn issue(&self, account: &UserAccount) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            role: account.role,
            clinician_id: account.clinician_id,
            exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
            iat: now.timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &AccessTokenClaims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// Verify an access token, returning the claims on success.
    ///
    /// Expired tokens and bad signatures both yield `None`.
    pub fn verify(&self, token: &str) -> Option<AccessTokenClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        decode::<AccessTokenClaims>(token, &self.decoding, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::auth::Role;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn account(clinician_id: Option<Uuid>) -> UserAccount {
        UserAccount {
            id: Uuid::now_v7(),
            email: "dr@example.com".into(),
            name: "Dr Example".into(),
            role: Role::Clinician,
            clinician_id,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_with_expected_claims() {
        let keys = JwtKeys::from_secret(SECRET);
        let clinician = Uuid::now_v7();
        let acct = account(Some(clinician));
        let token = keys.issue(&acct).unwrap();

        let claims = keys.verify(&token).expect("valid token");
        assert_eq!(claims.sub, acct.id.to_string());
        assert_eq!(claims.user_id(), Some(acct.id));
        assert_eq!(claims.email, "dr@example.com");
        assert_eq!(claims.role, Role::Clinician);
        assert_eq!(claims.clinician_id, Some(clinician));
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_EXPIRY_SECS);
    }

    #[test]
    fn clinician_id_is_optional() {
        let keys = JwtKeys::from_secret(SECRET);
        let token = keys.issue(&account(None)).unwrap();
        assert_eq!(keys.verify(&token).unwrap().clinician_id, None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtKeys::from_secret(SECRET).issue(&account(None)).unwrap();
        let other = JwtKeys::from_secret(b"another-secret-another-secret-xx");
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::from_secret(SECRET);
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: Uuid::now_v7().to_string(),
            email: "dr@example.com".into(),
            role: Role::Admin,
            clinician_id: None,
            exp: now - 2 * 60 * 60,
            iat: now - 3 * 60 * 60,
        };
        let token = keys.sign(&claims).unwrap();
        assert!(keys.verify(&token).is_none());
    }

    #[test]
    fn no_grace_period_after_expiry() {
        let keys = JwtKeys::from_secret(SECRET);
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: Uuid::now_v7().to_string(),
            email: "dr@example.com".into(),
            role: Role::Clinician,
            clinician_id: None,
            exp: now - 5,
            iat: now - ACCESS_TOKEN_EXPIRY_SECS - 5,
        };
        let token = keys.sign(&claims).unwrap();
        assert!(keys.verify(&token).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = JwtKeys::from_secret(SECRET);
        assert!(keys.verify("").is_none());
        assert!(keys.verify("not.a.jwt").is_none());
    }
}
