//! Domain events and their synchronous dispatch.
//!
//! Events are explicit values with a fixed payload. Handlers run in
//! registration order inside the request that raised the event and must be
//! idempotent: the same event may be delivered more than once.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::appointments::AppointmentRow;
use crate::models::clinic::AppointmentStatus;

/// Event errors.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Appointment is not completed")]
    NotCompleted,

    #[error("Appointment is not paid")]
    NotPaid,

    #[error("Handler {handler} failed: {message}")]
    Handler {
        handler: &'static str,
        message: String,
    },

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// A completed appointment was marked as paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPaid {
    pub appointment_id: Uuid,
    pub clinician_id: Uuid,
    pub patient_id: Uuid,
    pub amount_cents: i64,
    pub session_date: NaiveDate,
    pub paid_on: NaiveDate,
}

impl AppointmentPaid {
    /// Build the event from a stored appointment.
    pub fn from_appointment(row: &AppointmentRow) -> Result<Self, EventError> {
        if row.status().ok() != Some(AppointmentStatus::Completed) {
            return Err(EventError::NotCompleted);
        }
        let paid_at = row.paid_at.ok_or(EventError::NotPaid)?;
        Ok(Self {
            appointment_id: row.id,
            clinician_id: row.clinician_id,
            patient_id: row.patient_id,
            amount_cents: row.price_cents,
            session_date: row.starts_at.date_naive(),
            paid_on: paid_at.date_naive(),
        })
    }

    /// Ledger description for the income entry.
    pub fn description(&self) -> String {
        format!("Session on {}", self.session_date)
    }
}

/// Every event the domain raises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    AppointmentPaid(AppointmentPaid),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::AppointmentPaid(_) => "appointment_paid",
        }
    }
}

/// Event handler. Implementations must tolerate redelivery.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent) -> Result<(), EventError>;

    /// Handler identifier for logging.
    fn name(&self) -> &'static str;
}

/// Ordered list of handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventBus {
    pub fn new(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        Self { handlers }
    }

    /// Run every handler in order. Stops at the first error.
    pub async fn dispatch(&self, event: &DomainEvent) -> Result<(), EventError> {
        for handler in &self.handlers {
            debug!(event = event.name(), handler = handler.name(), "dispatching event");
            handler.handle(event).await?;
        }
        Ok(())
    }
}

/// Projects payments into the finance ledger.
#[derive(Debug, Clone)]
pub struct LedgerProjector {
    pool: PgPool,
}

impl LedgerProjector {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventHandler for LedgerProjector {
    async fn handle(&self, event: &DomainEvent) -> Result<(), EventError> {
        match event {
            DomainEvent::AppointmentPaid(paid) => {
                // Free sessions leave no ledger trace.
                if paid.amount_cents <= 0 {
                    debug!(appointment_id = %paid.appointment_id, "skipping zero-amount payment");
                    return Ok(());
                }
                let entry = crate::finance::upsert_appointment_income(&self.pool, paid).await?;
                info!(
                    appointment_id = %paid.appointment_id,
                    transaction_id = %entry.id,
                    "recorded session income"
                );
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        "ledger"
    }
}
