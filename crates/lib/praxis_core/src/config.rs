//! Process-wide security settings.
//!
//! Loaded once at startup. Any problem here is fatal: the server must not
//! start without a valid encryption key and signing secret.

use std::fmt;

use thiserror::Error;

use crate::encryption::FieldCipher;

/// Environment variable holding the 64-hex-character field encryption key.
pub const ENCRYPTION_KEY_VAR: &str = "ENCRYPTION_KEY";
/// Environment variable holding the JWT signing secret.
pub const JWT_SECRET_VAR: &str = "JWT_SECRET";
/// Minimum length of the JWT signing secret.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Validated security settings.
#[derive(Clone)]
pub struct SecuritySettings {
    cipher: FieldCipher,
    jwt_secret: String,
}

impl SecuritySettings {
    /// Validate raw values. `None` and empty strings count as missing.
    pub fn from_values(
        encryption_key: Option<&str>,
        jwt_secret: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let key = encryption_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing(ENCRYPTION_KEY_VAR))?;
        let cipher = FieldCipher::from_hex_key(key).map_err(|e| ConfigError::Invalid {
            var: ENCRYPTION_KEY_VAR,
            reason: e.to_string(),
        })?;

        let secret = jwt_secret
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_VAR))?;
        if secret.chars().count() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: JWT_SECRET_VAR,
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        Ok(Self {
            cipher,
            jwt_secret: secret.to_string(),
        })
    }

    /// Read `ENCRYPTION_KEY` and `JWT_SECRET` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let key = std::env::var(ENCRYPTION_KEY_VAR).ok();
        let secret = std::env::var(JWT_SECRET_VAR).ok();
        Self::from_values(key.as_deref(), secret.as_deref())
    }

    pub fn cipher(&self) -> &FieldCipher {
        &self.cipher
    }

    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

impl fmt::Debug for SecuritySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecuritySettings")
            .field("cipher", &self.cipher)
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}
