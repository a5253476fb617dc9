//! Postgres-backed account and refresh token stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use super::store::{RefreshTokenStore, UserDirectory};
use crate::models::auth::{NewAccount, RefreshTokenRecord, Role, UserAccount};

const SELECT_ACCOUNT: &str = "SELECT u.id, u.email, u.name, u.role, u.password_hash, \
     u.created_at, cp.id AS clinician_id \
     FROM users u \
     LEFT JOIN clinician_profiles cp ON cp.user_id = u.id";

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    clinician_id: Option<Uuid>,
}

impl TryFrom<AccountRow> for UserAccount {
    type Error = AuthError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(AuthError::Internal)?;
        Ok(UserAccount {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            clinician_id: row.clinician_id,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Accounts in the `users` and `clinician_profiles` tables.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError> {
        let sql = format!("{SELECT_ACCOUNT} WHERE u.email = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserAccount::try_from).transpose()
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, AuthError> {
        let sql = format!("{SELECT_ACCOUNT} WHERE u.id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserAccount::try_from).transpose()
    }

    async fn create_clinician(&self, account: NewAccount) -> Result<UserAccount, AuthError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            "INSERT INTO users (id, email, name, role, password_hash) \
             VALUES ($1, $2, $3, 'clinician', $4) \
             RETURNING id, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .fetch_one(&mut *tx)
        .await;

        let (user_id, created_at) = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        let clinician_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO clinician_profiles \
             (id, user_id, display_name, specialty, default_session_price_cents) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(&account.name)
        .bind(&account.specialty)
        .bind(account.default_session_price_cents)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UserAccount {
            id: user_id,
            email: account.email,
            name: account.name,
            role: Role::Clinician,
            clinician_id: Some(clinician_id),
            password_hash: account.password_hash,
            created_at,
        })
    }
}

/// Refresh token hashes in the `refresh_tokens` table.
#[derive(Debug, Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(record.user_id)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "SELECT user_id, token_hash, expires_at FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(user_id, token_hash, expires_at)| RefreshTokenRecord {
            user_id,
            token_hash,
            expires_at,
        }))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
