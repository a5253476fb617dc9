//! Request and response bodies. JSON field names are camelCase.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use praxis_core::auth::service::SessionTokens;
use praxis_core::models::auth::UserView;
use praxis_core::models::clinic::{AppointmentStatus, PatientStatus, TransactionKind};

use crate::validation::FieldError;

/// Keeps "absent" (`None`) apart from explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Errors

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

// ---------------------------------------------------------------------------
// Health

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub db_connected: bool,
}

// ---------------------------------------------------------------------------
// Auth

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub default_session_price_cents: Option<i64>,
}

/// Body of refresh and logout. The cookie takes precedence when both exist.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserView,
}

impl From<SessionTokens> for AuthResponse {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".into(),
            expires_in: tokens.expires_in,
            user: tokens.user,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

// ---------------------------------------------------------------------------
// Patients

/// Emergency contact, stored as encrypted JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCreateRequest {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub clinical_context: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub session_price_cents: Option<i64>,
}

/// Partial update. Omitted fields are kept, `null` clears optional ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdateRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub diagnosis: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub clinical_context: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub emergency_contact: Option<Option<EmergencyContact>>,
    #[serde(default, deserialize_with = "nullable")]
    pub session_price_cents: Option<Option<i64>>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub status: Option<PatientStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Patient with PHI decrypted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientView {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub contact_phone: Option<String>,
    pub diagnosis: Option<String>,
    pub clinical_context: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub session_price_cents: Option<i64>,
    pub status: PatientStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientList {
    pub items: Vec<PatientView>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// ---------------------------------------------------------------------------
// Appointments

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCreateRequest {
    pub patient_id: Uuid,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub price_cents: i64,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notes

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreateRequest {
    #[serde(default)]
    pub appointment_id: Option<Uuid>,
    pub title: String,
    pub private_notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub private_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub title: String,
    pub private_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Finance

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCreateRequest {
    pub kind: String,
    pub amount_cents: i64,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub occurred_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub description: String,
    pub category: Option<String>,
    pub occurred_on: NaiveDate,
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub balance_cents: i64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_keeps_absent_apart_from_null() {
        let patch: PatientUpdateRequest =
            serde_json::from_str(r#"{"diagnosis": null, "contactPhone": "555"}"#).unwrap();
        assert_eq!(patch.diagnosis, Some(None));
        assert_eq!(patch.contact_phone, Some(Some("555".into())));
        assert_eq!(patch.clinical_context, None);
        assert_eq!(patch.full_name, None);
    }

    #[test]
    fn refresh_body_token_is_optional() {
        let empty: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.refresh_token.is_none());
        let with: RefreshRequest = serde_json::from_str(r#"{"refreshToken": "abc"}"#).unwrap();
        assert_eq!(with.refresh_token.as_deref(), Some("abc"));
    }

    #[test]
    fn error_response_omits_empty_details() {
        let body = ErrorResponse {
            error: "not_found".into(),
            message: "Patient not found".into(),
            details: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
    }
}
