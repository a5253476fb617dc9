//! Patient persistence.
//!
//! PHI columns arrive here already encrypted and leave still encrypted; the
//! HTTP service layer owns the cipher. Every query is scoped to a clinician.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::clinic::PatientStatus;

/// Row returned by patient queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PatientRow {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    /// Encrypted.
    pub contact_phone: Option<String>,
    /// Encrypted.
    pub diagnosis: Option<String>,
    /// Encrypted.
    pub clinical_context: Option<String>,
    /// Encrypted JSON.
    pub emergency_contact: Option<String>,
    pub session_price_cents: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a new patient. Encrypted fields must already be sealed.
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub full_name: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub contact_phone: Option<String>,
    pub diagnosis: Option<String>,
    pub clinical_context: Option<String>,
    pub emergency_contact: Option<String>,
    pub session_price_cents: Option<i64>,
}

/// List filter. `search` matches plaintext columns only.
#[derive(Debug, Clone)]
pub struct PatientFilter {
    pub search: Option<String>,
    pub status: Option<PatientStatus>,
    pub limit: i64,
    pub offset: i64,
}

const PATIENT_COLUMNS: &str = "id, clinician_id, full_name, email, birth_date, contact_phone, \
     diagnosis, clinical_context, emergency_contact, session_price_cents, status, \
     created_at, updated_at";

/// Build an `ILIKE` pattern that matches `term` literally anywhere.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Create a patient.
pub async fn create_patient(
    pool: &PgPool,
    clinician_id: &Uuid,
    patient: &NewPatient,
) -> Result<PatientRow, sqlx::Error> {
    let sql = format!(
        "INSERT INTO patients (id, clinician_id, full_name, email, birth_date, contact_phone, \
         diagnosis, clinical_context, emergency_contact, session_price_cents) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {PATIENT_COLUMNS}"
    );
    sqlx::query_as::<_, PatientRow>(&sql)
        .bind(Uuid::now_v7())
        .bind(clinician_id)
        .bind(&patient.full_name)
        .bind(&patient.email)
        .bind(patient.birth_date)
        .bind(&patient.contact_phone)
        .bind(&patient.diagnosis)
        .bind(&patient.clinical_context)
        .bind(&patient.emergency_contact)
        .bind(patient.session_price_cents)
        .fetch_one(pool)
        .await
}

/// List patients for a clinician, ordered by name. Returns (rows, total).
pub async fn list_patients(
    pool: &PgPool,
    clinician_id: &Uuid,
    filter: &PatientFilter,
) -> Result<(Vec<PatientRow>, i64), sqlx::Error> {
    let pattern = filter.search.as_deref().map(contains_pattern);
    let status = filter.status.map(|s| s.as_str());

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM patients
        WHERE clinician_id = $1
          AND ($2::text IS NULL OR full_name ILIKE $2 OR email ILIKE $2)
          AND ($3::text IS NULL OR status = $3)
        "#,
    )
    .bind(clinician_id)
    .bind(&pattern)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let sql = format!(
        r#"
        SELECT {PATIENT_COLUMNS} FROM patients
        WHERE clinician_id = $1
          AND ($2::text IS NULL OR full_name ILIKE $2 OR email ILIKE $2)
          AND ($3::text IS NULL OR status = $3)
        ORDER BY full_name ASC, id ASC
        LIMIT $4 OFFSET $5
        "#
    );
    let rows = sqlx::query_as::<_, PatientRow>(&sql)
        .bind(clinician_id)
        .bind(&pattern)
        .bind(status)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Get a patient by ID (scoped to clinician).
pub async fn get_patient(
    pool: &PgPool,
    clinician_id: &Uuid,
    patient_id: &Uuid,
) -> Result<Option<PatientRow>, sqlx::Error> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1 AND clinician_id = $2");
    sqlx::query_as::<_, PatientRow>(&sql)
        .bind(patient_id)
        .bind(clinician_id)
        .fetch_optional(pool)
        .await
}

/// Write back every mutable column of `row`.
pub async fn update_patient(pool: &PgPool, row: &PatientRow) -> Result<Option<PatientRow>, sqlx::Error> {
    let sql = format!(
        "UPDATE patients SET full_name = $1, email = $2, birth_date = $3, contact_phone = $4, \
         diagnosis = $5, clinical_context = $6, emergency_contact = $7, \
         session_price_cents = $8, status = $9, updated_at = now() \
         WHERE id = $10 AND clinician_id = $11 \
         RETURNING {PATIENT_COLUMNS}"
    );
    sqlx::query_as::<_, PatientRow>(&sql)
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(row.birth_date)
        .bind(&row.contact_phone)
        .bind(&row.diagnosis)
        .bind(&row.clinical_context)
        .bind(&row.emergency_contact)
        .bind(row.session_price_cents)
        .bind(&row.status)
        .bind(row.id)
        .bind(row.clinician_id)
        .fetch_optional(pool)
        .await
}

/// Delete a patient (appointments and notes cascade).
pub async fn delete_patient(
    pool: &PgPool,
    clinician_id: &Uuid,
    patient_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM patients WHERE id = $1 AND clinician_id = $2")
        .bind(patient_id)
        .bind(clinician_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ana"), "%ana%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
