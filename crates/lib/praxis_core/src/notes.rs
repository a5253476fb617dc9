//! Clinical note persistence. `private_notes` is stored encrypted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Row returned by note queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub title: String,
    /// Encrypted.
    pub private_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a new note. `private_notes` must already be sealed.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub title: String,
    pub private_notes: String,
}

const NOTE_COLUMNS: &str =
    "id, clinician_id, patient_id, appointment_id, title, private_notes, created_at, updated_at";

/// Create a note. The caller checks patient and appointment ownership.
pub async fn create_note(
    pool: &PgPool,
    clinician_id: &Uuid,
    note: &NewNote,
) -> Result<NoteRow, sqlx::Error> {
    let sql = format!(
        "INSERT INTO clinical_notes (id, clinician_id, patient_id, appointment_id, title, private_notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {NOTE_COLUMNS}"
    );
    sqlx::query_as::<_, NoteRow>(&sql)
        .bind(Uuid::now_v7())
        .bind(clinician_id)
        .bind(note.patient_id)
        .bind(note.appointment_id)
        .bind(&note.title)
        .bind(&note.private_notes)
        .fetch_one(pool)
        .await
}

/// List a patient's notes, newest first.
pub async fn list_notes(
    pool: &PgPool,
    clinician_id: &Uuid,
    patient_id: &Uuid,
) -> Result<Vec<NoteRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {NOTE_COLUMNS} FROM clinical_notes \
         WHERE clinician_id = $1 AND patient_id = $2 \
         ORDER BY created_at DESC"
    );
    sqlx::query_as::<_, NoteRow>(&sql)
        .bind(clinician_id)
        .bind(patient_id)
        .fetch_all(pool)
        .await
}

/// Get a note by ID (scoped to clinician).
pub async fn get_note(
    pool: &PgPool,
    clinician_id: &Uuid,
    note_id: &Uuid,
) -> Result<Option<NoteRow>, sqlx::Error> {
    let sql = format!("SELECT {NOTE_COLUMNS} FROM clinical_notes WHERE id = $1 AND clinician_id = $2");
    sqlx::query_as::<_, NoteRow>(&sql)
        .bind(note_id)
        .bind(clinician_id)
        .fetch_optional(pool)
        .await
}

/// Replace title and body of a note.
pub async fn update_note(
    pool: &PgPool,
    clinician_id: &Uuid,
    note_id: &Uuid,
    title: &str,
    private_notes: &str,
) -> Result<Option<NoteRow>, sqlx::Error> {
    let sql = format!(
        "UPDATE clinical_notes SET title = $1, private_notes = $2, updated_at = now() \
         WHERE id = $3 AND clinician_id = $4 \
         RETURNING {NOTE_COLUMNS}"
    );
    sqlx::query_as::<_, NoteRow>(&sql)
        .bind(title)
        .bind(private_notes)
        .bind(note_id)
        .bind(clinician_id)
        .fetch_optional(pool)
        .await
}

/// Delete a note.
pub async fn delete_note(
    pool: &PgPool,
    clinician_id: &Uuid,
    note_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM clinical_notes WHERE id = $1 AND clinician_id = $2")
        .bind(note_id)
        .bind(clinician_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
