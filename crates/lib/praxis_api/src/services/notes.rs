//! Clinical notes service. `private_notes` never leaves this module sealed.

use praxis_core::appointments;
use praxis_core::encryption::FieldCipher;
use praxis_core::notes::{self as store, NewNote, NoteRow};
use praxis_core::patients;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::NoteView;
use crate::validation::{NoteInput, NotePatch};

fn not_found() -> AppError {
    AppError::NotFound("Note not found".into())
}

pub fn open(cipher: &FieldCipher, row: NoteRow) -> AppResult<NoteView> {
    Ok(NoteView {
        private_notes: cipher.decrypt(&row.private_notes)?,
        id: row.id,
        patient_id: row.patient_id,
        appointment_id: row.appointment_id,
        title: row.title,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn ensure_patient(pool: &PgPool, clinician_id: &Uuid, patient_id: &Uuid) -> AppResult<()> {
    patients::get_patient(pool, clinician_id, patient_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Patient not found".into()))
}

pub async fn create_note(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    patient_id: &Uuid,
    input: NoteInput,
) -> AppResult<NoteView> {
    ensure_patient(pool, clinician_id, patient_id).await?;

    if let Some(appointment_id) = &input.appointment_id {
        let same_patient = appointments::get_appointment(pool, clinician_id, appointment_id)
            .await?
            .is_some_and(|a| a.patient_id == *patient_id);
        if !same_patient {
            return Err(AppError::invalid_field(
                "appointmentId",
                "must be an appointment of the same patient",
            ));
        }
    }

    let note = NewNote {
        patient_id: *patient_id,
        appointment_id: input.appointment_id,
        title: input.title,
        private_notes: cipher.encrypt(&input.private_notes)?,
    };
    let row = store::create_note(pool, clinician_id, &note).await?;
    info!(note_id = %row.id, patient_id = %patient_id, "clinical note created");
    open(cipher, row)
}

pub async fn list_notes(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    patient_id: &Uuid,
) -> AppResult<Vec<NoteView>> {
    ensure_patient(pool, clinician_id, patient_id).await?;
    store::list_notes(pool, clinician_id, patient_id)
        .await?
        .into_iter()
        .map(|row| open(cipher, row))
        .collect()
}

pub async fn get_note(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    note_id: &Uuid,
) -> AppResult<NoteView> {
    let row = store::get_note(pool, clinician_id, note_id)
        .await?
        .ok_or_else(not_found)?;
    open(cipher, row)
}

pub async fn update_note(
    pool: &PgPool,
    cipher: &FieldCipher,
    clinician_id: &Uuid,
    note_id: &Uuid,
    patch: NotePatch,
) -> AppResult<NoteView> {
    let current = store::get_note(pool, clinician_id, note_id)
        .await?
        .ok_or_else(not_found)?;

    let title = patch.title.unwrap_or(current.title);
    // An untouched body keeps its stored ciphertext.
    let private_notes = match patch.private_notes {
        Some(text) => cipher.encrypt(&text)?,
        None => current.private_notes,
    };

    let row = store::update_note(pool, clinician_id, note_id, &title, &private_notes)
        .await?
        .ok_or_else(not_found)?;
    info!(note_id = %row.id, "clinical note updated");
    open(cipher, row)
}

pub async fn delete_note(pool: &PgPool, clinician_id: &Uuid, note_id: &Uuid) -> AppResult<()> {
    if !store::delete_note(pool, clinician_id, note_id).await? {
        return Err(not_found());
    }
    info!(note_id = %note_id, "clinical note deleted");
    Ok(())
}
