//! Extractors that report malformed requests as `validation_error` responses.
//!
//! Plain `axum::Json`, `Query` and `Path` reject with a plaintext 4xx. These
//! wrappers route the rejection through [`AppError`] so clients always get
//! the JSON error body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;
use crate::validation::FieldError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Text after the rejection's fixed prefix, e.g. `name: invalid type: ...`.
fn rejection_detail(body_text: &str) -> &str {
    body_text
        .split_once(": ")
        .map_or(body_text, |(_, detail)| detail)
}

fn strip_position(detail: &str) -> &str {
    detail
        .rfind(" at line ")
        .map_or(detail, |at| &detail[..at])
}

fn is_field_path(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

/// Build a field error from a serde message.
///
/// Understands `path: message` prefixes and `missing field` errors; anything
/// else is reported against `fallback`.
pub fn deserialize_field_error(detail: &str, fallback: &str) -> FieldError {
    let detail = strip_position(detail);
    let (path, message) = match detail.split_once(": ") {
        Some((path, rest)) if is_field_path(path) => (Some(path), rest),
        _ => (None, detail),
    };

    if let Some(name) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name)
    {
        let field = match path {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        return FieldError {
            field,
            message: "is required".into(),
        };
    }

    FieldError {
        field: path.unwrap_or(fallback).to_string(),
        message: message.to_string(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                vec![deserialize_field_error(rejection_detail(&e.body_text()), "body")].into()
            }
            JsonRejection::JsonSyntaxError(_) => AppError::invalid("Request body is not valid JSON"),
            JsonRejection::MissingJsonContentType(_) => {
                AppError::invalid("Expected a JSON body with `Content-Type: application/json`")
            }
            other => AppError::invalid(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        match rejection {
            QueryRejection::FailedToDeserializeQueryString(e) => {
                vec![deserialize_field_error(rejection_detail(&e.body_text()), "query")].into()
            }
            other => AppError::invalid(other.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                AppError::invalid_field("id", format!("is not valid: {}", e.body_text()))
            }
            other => AppError::Internal(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_top_level_field() {
        let err = deserialize_field_error("missing field `password` at line 1 column 29", "body");
        assert_eq!(err.field, "password");
        assert_eq!(err.message, "is required");
    }

    #[test]
    fn missing_nested_field_keeps_the_parent_path() {
        let err = deserialize_field_error("emergencyContact: missing field `phone`", "body");
        assert_eq!(err.field, "emergencyContact.phone");
    }

    #[test]
    fn wrong_type_is_reported_on_its_path() {
        let err = deserialize_field_error(
            "defaultSessionPriceCents: invalid type: string \"abc\", expected i64 at line 1 column 40",
            "body",
        );
        assert_eq!(err.field, "defaultSessionPriceCents");
        assert_eq!(err.message, "invalid type: string \"abc\", expected i64");
    }

    #[test]
    fn pathless_message_uses_the_fallback() {
        let err = deserialize_field_error("invalid type: integer `3`, expected a string", "query");
        assert_eq!(err.field, "query");
        assert_eq!(err.message, "invalid type: integer `3`, expected a string");
    }

    #[test]
    fn prefix_is_dropped_from_rejection_text() {
        let text = "Failed to deserialize the JSON body into the target type: name: invalid type";
        assert_eq!(rejection_detail(text), "name: invalid type");
    }
}
