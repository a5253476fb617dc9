//! Patient service: seals PHI before writes and opens it after reads.

use praxis_core::encryption::{EncryptionError, FieldCipher};
use praxis_core::models::clinic::PatientStatus;
use praxis_core::patients::{self as store, NewPatient, PatientFilter, PatientRow};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{EmergencyContact, PatientList, PatientListQuery, PatientView};
use crate::validation::{PatientInput, PatientPatch};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp client paging to `1..=100` rows and a non-negative offset.
pub fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

fn not_found() -> AppError {
    AppError::NotFound("Patient not found".into())
}

fn seal_contact(
    cipher: &FieldCipher,
    contact: Option<&EmergencyContact>,
) -> AppResult<Option<String>> {
    let Some(contact) = contact else {
        return Ok(None);
    };
    let json = serde_json::to_string(contact)
        .map_err(|e| AppError::Internal(format!("emergency contact encode: {e}")))?;
    Ok(Some(cipher.encrypt(&json)?))
}

fn open_contact(
    cipher: &FieldCipher,
    sealed: Option<&str>,
) -> Result<Option<EmergencyContact>, EncryptionError> {
    cipher
        .decrypt_opt(sealed)?
        .map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| EncryptionError::Format(format!("emergency contact JSON: {e}")))
        })
        .transpose()
}

/// Encrypt the PHI fields of a new patient.
pub fn seal(cipher: &FieldCipher, input: &PatientInput) -> AppResult<NewPatient> {
    Ok(NewPatient {
        full_name: input.full_name.clone(),
        email: input.email.clone(),
        birth_date: input.birth_date,
        contact_phone: cipher.encrypt_opt(input.contact_phone.as_deref())?,
        diagnosis: cipher.encrypt_opt(input.diagnosis.as_deref())?,
        clinical_context: cipher.encrypt_opt(input.clinical_context.as_deref())?,
        emergency_contact: seal_contact(cipher, input.emergency_contact.as_ref())?,
        session_price_cents: input.session_price_cents,
    })
}

/// Decrypt a stored patient. Any tampered field fails the whole read.
pub fn open(cipher: &FieldCipher, row: PatientRow) -> AppResult<PatientView> {
    let status = row
        .status
        .parse::<PatientStatus>()
        .map_err(AppError::Internal)?;
    Ok(PatientView {
        id: row.id,
        contact_phone: cipher.decrypt_opt(row.contact_phone.as_deref())?,
        diagnosis: cipher.decrypt_opt(row.diagnosis.as_deref())?,
        clinical_context: cipher.decrypt_opt(row.clinical_context.as_deref())?,
        emergency_contact: open_contact(cipher, row.emergency_contact.as_deref())?,
        full_name: row.full_name,
        email: row.email,
        birth_date: row.birth_date,
        session_price_cents: row.session_price_cents,
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Apply a patch to a stored row. Only touched PHI fields are re-encrypted.
pub fn apply_patch(
    cipher: &FieldCipher,
    mut row: PatientRow,
    patch: PatientPatch,
) -> AppResult<PatientRow> {
    if let Some(full_name) = patch.full_name {
        row.full_name = full_name;
    }
    if let Some(email) = patch.email {
        row.email = email;
    }
    if let Some(birth_date) = patch.birth_date {
        row.birth_date = birth_date;
    }
    if let Some(phone) = patch.contact_phone {
        row.contact_phone = cipher.encrypt_opt(phone.as_deref())?;
    }
    if let Some(diagnosis) = patch.diagnosis {
        row.diagnosis = cipher.encrypt_opt(diagnosis.as_deref())?;
    }
    if let Some(context) = patch.clinical_context {
        row.clinical_context = cipher.encrypt_opt(context.as_deref())?;
    }
    if let Some(contact) = patch.emergency_contact {
        row.emergency_contact = seal_contact(cipher, contact.as_ref())?;
    }
    if let Some(price) = patch.session_price_cents {
        row.session_price_cents = price;
    }
    if let Some(status) = patch.status {
        row.status = status.as_str().to_string();
    }
    Ok(row)
}

pub async fn create_patient(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    input: &PatientInput,
) -> AppResult<PatientView> {
    let row = store::create_patient(pool, clinician_id, &seal(cipher, input)?).await?;
    info!(patient_id = %row.id, clinician_id = %clinician_id, "patient created");
    open(cipher, row)
}

pub async fn list_patients(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    query: PatientListQuery,
) -> AppResult<PatientList> {
    let (limit, offset) = page(query.limit, query.offset);
    let filter = PatientFilter {
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        status: query.status,
        limit,
        offset,
    };
    let (rows, total) = store::list_patients(pool, clinician_id, &filter).await?;
    let items = rows
        .into_iter()
        .map(|row| open(cipher, row))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(PatientList {
        items,
        total,
        limit,
        offset,
    })
}

pub async fn get_patient(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    patient_id: &Uuid,
) -> AppResult<PatientView> {
    let row = store::get_patient(pool, clinician_id, patient_id)
        .await?
        .ok_or_else(not_found)?;
    open(cipher, row)
}

pub async fn update_patient(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    patient_id: &Uuid,
    patch: PatientPatch,
) -> AppResult<PatientView> {
    let current = store::get_patient(pool, clinician_id, patient_id)
        .await?
        .ok_or_else(not_found)?;
    let updated = apply_patch(cipher, current, patch)?;
    let row = store::update_patient(pool, &updated)
        .await?
        .ok_or_else(not_found)?;
    info!(patient_id = %row.id, "patient updated");
    open(cipher, row)
}

pub async fn delete_patient(
    pool: &PgPool,
    clinician_id: &Uuid,
    patient_id: &Uuid,
) -> AppResult<()> {
    if !store::delete_patient(pool, clinician_id, patient_id).await? {
        return Err(not_found());
    }
    info!(patient_id = %patient_id, "patient deleted");
    Ok(())
}
