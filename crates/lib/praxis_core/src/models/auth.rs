//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! shapes (which are camelCase and never carry password hashes).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Clinician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Clinician => "clinician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "clinician" => Ok(Role::Clinician),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Stored account, including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub clinician_id: Option<Uuid>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Sanitized view without the password hash.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            clinician_id: self.clinician_id,
        }
    }
}

/// Account as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinician_id: Option<Uuid>,
}

/// Input for creating a clinician account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Already normalized (trimmed, lowercased).
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub specialty: Option<String>,
    pub default_session_price_cents: i64,
}

/// Refresh token record stored in the database. Only the hash is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    /// SHA-256 of the raw token, lowercase hex (64 chars).
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    /// Subject: user ID (standard JWT `sub` claim).
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician_id: Option<Uuid>,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

impl AccessTokenClaims {
    /// Parsed subject.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Clinician] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn claims_use_camel_case_and_omit_missing_clinician() {
        let claims = AccessTokenClaims {
            sub: Uuid::nil().to_string(),
            email: "a@b.co".into(),
            role: Role::Admin,
            clinician_id: None,
            exp: 2,
            iat: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("clinicianId").is_none());

        let with = AccessTokenClaims {
            clinician_id: Some(Uuid::nil()),
            ..claims
        };
        let json = serde_json::to_value(&with).unwrap();
        assert!(json.get("clinicianId").is_some());
    }

    #[test]
    fn user_view_has_no_password_hash() {
        let account = UserAccount {
            id: Uuid::nil(),
            email: "dr@example.com".into(),
            name: "Dr Who".into(),
            role: Role::Clinician,
            clinician_id: Some(Uuid::nil()),
            password_hash: "$2b$10$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&account.view()).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.to_lowercase().contains("password"));
    }
}
