//! Appointment persistence and status rules.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::clinic::AppointmentStatus;

/// Row returned by appointment queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub patient_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub price_cents: i64,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentRow {
    /// Parsed status. Unknown text is a schema violation.
    pub fn status(&self) -> Result<AppointmentStatus, String> {
        self.status.parse()
    }

    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }
}

/// Values for a new appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price_cents: i64,
}

/// List filter; all bounds optional.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub patient_id: Option<Uuid>,
}

/// Whether `row` may move to `next`.
///
/// A paid appointment stays completed; everything else is free to change.
pub fn status_change_allowed(row: &AppointmentRow, next: AppointmentStatus) -> bool {
    !(row.is_paid() && next != AppointmentStatus::Completed)
}

const APPOINTMENT_COLUMNS: &str = "id, clinician_id, patient_id, starts_at, duration_minutes, \
     status, price_cents, paid_at, created_at, updated_at";

/// Price for a new session with `patient_id`: the patient's own price, else
/// the clinician's default. `None` if the patient is not the clinician's.
pub async fn default_price(
    pool: &PgPool,
    clinician_id: &Uuid,
    patient_id: &Uuid,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(p.session_price_cents, cp.default_session_price_cents)
        FROM patients p
        JOIN clinician_profiles cp ON cp.id = p.clinician_id
        WHERE p.id = $1 AND p.clinician_id = $2
        "#,
    )
    .bind(patient_id)
    .bind(clinician_id)
    .fetch_optional(pool)
    .await
}

/// Create an appointment. The caller checks patient ownership.
pub async fn create_appointment(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment: &NewAppointment,
) -> Result<AppointmentRow, sqlx::Error> {
    let sql = format!(
        "INSERT INTO appointments (id, clinician_id, patient_id, starts_at, duration_minutes, price_cents) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {APPOINTMENT_COLUMNS}"
    );
    sqlx::query_as::<_, AppointmentRow>(&sql)
        .bind(Uuid::now_v7())
        .bind(clinician_id)
        .bind(appointment.patient_id)
        .bind(appointment.starts_at)
        .bind(appointment.duration_minutes)
        .bind(appointment.price_cents)
        .fetch_one(pool)
        .await
}

/// List appointments ordered by start time.
pub async fn list_appointments(
    pool: &PgPool,
    clinician_id: &Uuid,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS} FROM appointments
        WHERE clinician_id = $1
          AND ($2::timestamptz IS NULL OR starts_at >= $2)
          AND ($3::timestamptz IS NULL OR starts_at < $3)
          AND ($4::uuid IS NULL OR patient_id = $4)
        ORDER BY starts_at ASC
        "#
    );
    sqlx::query_as::<_, AppointmentRow>(&sql)
        .bind(clinician_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.patient_id)
        .fetch_all(pool)
        .await
}

/// Get an appointment by ID (scoped to clinician).
pub async fn get_appointment(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1 AND clinician_id = $2"
    );
    sqlx::query_as::<_, AppointmentRow>(&sql)
        .bind(appointment_id)
        .bind(clinician_id)
        .fetch_optional(pool)
        .await
}

/// Set the status of an appointment.
pub async fn update_status(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
    status: AppointmentStatus,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    let sql = format!(
        "UPDATE appointments SET status = $1, updated_at = now() \
         WHERE id = $2 AND clinician_id = $3 \
         RETURNING {APPOINTMENT_COLUMNS}"
    );
    sqlx::query_as::<_, AppointmentRow>(&sql)
        .bind(status.as_str())
        .bind(appointment_id)
        .bind(clinician_id)
        .fetch_optional(pool)
        .await
}

/// Stamp `paid_at` on a completed appointment. An existing stamp is kept.
pub async fn mark_paid(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    let sql = format!(
        "UPDATE appointments SET paid_at = COALESCE(paid_at, now()), updated_at = now() \
         WHERE id = $1 AND clinician_id = $2 AND status = 'completed' \
         RETURNING {APPOINTMENT_COLUMNS}"
    );
    sqlx::query_as::<_, AppointmentRow>(&sql)
        .bind(appointment_id)
        .bind(clinician_id)
        .fetch_optional(pool)
        .await
}

/// Delete an appointment.
pub async fn delete_appointment(
    pool: &PgPool,
    clinician_id: &Uuid,
    appointment_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND clinician_id = $2")
        .bind(appointment_id)
        .bind(clinician_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn row(status: AppointmentStatus, paid: bool) -> AppointmentRow {
        let now = Utc::now();
        AppointmentRow {
            id: Uuid::now_v7(),
            clinician_id: Uuid::now_v7(),
            patient_id: Uuid::now_v7(),
            starts_at: now,
            duration_minutes: 50,
            status: status.as_str().to_string(),
            price_cents: 12000,
            paid_at: paid.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn paid_appointment_stays_completed() {
        let paid = row(AppointmentStatus::Completed, true);
        assert!(status_change_allowed(&paid, AppointmentStatus::Completed));
        assert!(!status_change_allowed(&paid, AppointmentStatus::Cancelled));
        assert!(!status_change_allowed(&paid, AppointmentStatus::Scheduled));
    }

    #[test]
    fn unpaid_appointment_moves_freely() {
        let done = row(AppointmentStatus::Completed, false);
        assert!(status_change_allowed(&done, AppointmentStatus::Scheduled));
        let scheduled = row(AppointmentStatus::Scheduled, false);
        assert!(status_change_allowed(&scheduled, AppointmentStatus::NoShow));
        assert_eq!(scheduled.status().unwrap(), AppointmentStatus::Scheduled);
    }
}
