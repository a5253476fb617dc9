//! API server configuration.

use praxis_core::config::{ConfigError, SecuritySettings};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Encryption key and JWT secret, validated.
    pub security: SecuritySettings,
    /// Whether auth cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable         | Default                             |
    /// |------------------|-------------------------------------|
    /// | `BIND_ADDR`      | `127.0.0.1:3100`                    |
    /// | `DATABASE_URL`   | `postgres://localhost:5432/praxis`  |
    /// | `ENCRYPTION_KEY` | required, 64 hex characters         |
    /// | `JWT_SECRET`     | required, at least 32 characters    |
    /// | `COOKIE_SECURE`  | `true`                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/praxis".into()),
            security: SecuritySettings::from_env()?,
            cookie_secure: parse_cookie_secure(std::env::var("COOKIE_SECURE").ok().as_deref()),
        })
    }
}

/// Only an explicit `false` or `0` turns the `Secure` attribute off.
pub fn parse_cookie_secure(raw: Option<&str>) -> bool {
    !matches!(
        raw.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("false" | "0")
    )
}
