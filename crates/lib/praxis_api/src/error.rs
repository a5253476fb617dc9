//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use praxis_core::auth::AuthError;
use praxis_core::encryption::EncryptionError;
use praxis_core::events::EventError;

use crate::models::ErrorResponse;
use crate::validation::FieldError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Stored data could not be decrypted: {0}")]
    DecryptionFailed(EncryptionError),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// A validation failure without field details.
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// A validation failure for a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            message: format!("{field} {message}"),
            details: vec![FieldError {
                field: field.to_string(),
                message,
            }],
        }
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(details: Vec<FieldError>) -> Self {
        let message = match details.as_slice() {
            [only] => format!("{} {}", only.field, only.message),
            _ => format!("{} fields are invalid", details.len()),
        };
        AppError::Validation { message, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, details) = match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                (!details.is_empty()).then_some(details),
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m, None),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m, None),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m, None),
            AppError::DecryptionFailed(e) => {
                error!("decryption failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "decryption_failed",
                    "Stored data could not be decrypted".to_string(),
                    None,
                )
            }
            AppError::Internal(m) => {
                error!("internal error: {m}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            details,
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid or expired session".into()),
            AuthError::EmailTaken => AppError::invalid_field("email", "is already registered"),
            AuthError::TokenError(msg) => AppError::Internal(msg),
            AuthError::DbError(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<EncryptionError> for AppError {
    fn from(e: EncryptionError) -> Self {
        match e {
            EncryptionError::Format(_) | EncryptionError::Tampered => AppError::DecryptionFailed(e),
            EncryptionError::InvalidKey(msg) | EncryptionError::Encrypt(msg) => {
                AppError::Internal(msg)
            }
        }
    }
}

impl From<EventError> for AppError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::NotCompleted => {
                AppError::invalid("Only completed appointments can be paid")
            }
            EventError::NotPaid => AppError::Internal("appointment has no payment stamp".into()),
            EventError::Handler { handler, message } => {
                AppError::Internal(format!("{handler}: {message}"))
            }
            EventError::DbError(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_carry_details() {
        let err = AppError::from(vec![
            FieldError {
                field: "email".into(),
                message: "must be a valid email address".into(),
            },
            FieldError {
                field: "password".into(),
                message: "must be at least 8 characters".into(),
            },
        ]);
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"].as_array().unwrap().len(), 2);
        assert_eq!(json["details"][0]["field"], "email");
    }

    #[tokio::test]
    async fn auth_failures_are_generic_401s() {
        for err in [AuthError::InvalidCredentials, AuthError::InvalidToken] {
            let resp = AppError::from(err).into_response();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let json = body_json(resp).await;
            assert_eq!(json["error"], "unauthorized");
            assert!(json.get("details").is_none());
        }
    }

    #[tokio::test]
    async fn taken_email_is_a_field_error() {
        let resp = AppError::from(AuthError::EmailTaken).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["details"][0]["field"], "email");
    }

    #[tokio::test]
    async fn tampered_data_is_a_500_not_empty_data() {
        let resp = AppError::from(EncryptionError::Tampered).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "decryption_failed");
    }

    #[tokio::test]
    async fn internal_messages_are_hidden() {
        let resp = AppError::Internal("connection refused on 10.0.0.5".into()).into_response();
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Internal server error");
    }
}
