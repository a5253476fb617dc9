//! Scheduling service.

use praxis_core::appointments::{
    self as store, AppointmentFilter, AppointmentRow, NewAppointment, status_change_allowed,
};
use praxis_core::events::{AppointmentPaid, DomainEvent, EventBus};
use praxis_core::models::clinic::AppointmentStatus;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{AppointmentListQuery, AppointmentView};
use crate::validation::AppointmentInput;

fn not_found() -> AppError {
    AppError::NotFound("Appointment not found".into())
}

pub fn view(row: AppointmentRow) -> AppResult<AppointmentView> {
    let status = row.status().map_err(AppError::Internal)?;
    Ok(AppointmentView {
        id: row.id,
        patient_id: row.patient_id,
        starts_at: row.starts_at,
        duration_minutes: row.duration_minutes,
        status,
        price_cents: row.price_cents,
        paid_at: row.paid_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub async fn create_appointment(
    pool: &PgPool,
    clinician_id: &Uuid,
    input: AppointmentInput,
) -> AppResult<AppointmentView> {
    // Also proves the patient belongs to this clinician.
    let fallback_price = store::default_price(pool, clinician_id, &input.patient_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient not found".into()))?;

    let row = store::create_appointment(
        pool,
        clinician_id,
        &NewAppointment {
            patient_id: input.patient_id,
            starts_at: input.starts_at,
            duration_minutes: input.duration_minutes,
            price_cents: input.price_cents.unwrap_or(fallback_price),
        },
    )
    .await?;
    info!(appointment_id = %row.id, patient_id = %row.patient_id, "appointment scheduled");
    view(row)
}

pub async fn list_appointments(
    pool: &PgPool,
    clinician_id: &Uuid,
    query: AppointmentListQuery,
) -> AppResult<Vec<AppointmentView>> {
    let filter = AppointmentFilter {
        from: query.from,
        to: query.to,
        patient_id: query.patient_id,
    };
    store::list_appointments(pool, clinician_id, &filter)
        .await?
        .into_iter()
        .map(view)
        .collect()
}

pub async fn get_appointment(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
) -> AppResult<AppointmentView> {
    let row = store::get_appointment(pool, clinician_id, appointment_id)
        .await?
        .ok_or_else(not_found)?;
    view(row)
}

pub async fn update_status(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
    next: AppointmentStatus,
) -> AppResult<AppointmentView> {
    let current = store::get_appointment(pool, clinician_id, appointment_id)
        .await?
        .ok_or_else(not_found)?;
    if !status_change_allowed(&current, next) {
        return Err(AppError::invalid_field(
            "status",
            "cannot change once the appointment is paid",
        ));
    }
    let row = store::update_status(pool, clinician_id, appointment_id, next)
        .await?
        .ok_or_else(not_found)?;
    info!(appointment_id = %row.id, status = %next, "appointment status changed");
    view(row)
}

/// Mark a completed appointment as paid and publish `AppointmentPaid`.
///
/// Paying twice keeps the first `paid_at` and re-publishes the same event;
/// handlers absorb the repeat.
pub async fn mark_paid(
    pool: &PgPool,
    events: &EventBus,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
) -> AppResult<AppointmentView> {
    let current = store::get_appointment(pool, clinician_id, appointment_id)
        .await?
        .ok_or_else(not_found)?;
    if current.status().ok() != Some(AppointmentStatus::Completed) {
        return Err(AppError::invalid("Only completed appointments can be paid"));
    }

    // `None` here means the status changed under us.
    let row = store::mark_paid(pool, clinician_id, appointment_id)
        .await?
        .ok_or_else(|| AppError::invalid("Only completed appointments can be paid"))?;

    let event = DomainEvent::AppointmentPaid(AppointmentPaid::from_appointment(&row)?);
    events.dispatch(&event).await?;
    info!(appointment_id = %row.id, amount_cents = row.price_cents, "appointment paid");
    view(row)
}

pub async fn delete_appointment(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
) -> AppResult<()> {
    if !store::delete_appointment(pool, clinician_id, appointment_id).await? {
        return Err(not_found());
    }
    info!(appointment_id = %appointment_id, "appointment deleted");
    Ok(())
}
