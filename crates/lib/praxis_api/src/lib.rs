//! # praxis_api
//!
//! HTTP API library for Praxis.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod validation;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use praxis_core::auth::service::AuthService;
use praxis_core::encryption::FieldCipher;
use praxis_core::events::EventBus;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{appointments, auth, finance, health, notes, patients};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration, including the validated secrets.
    pub config: ApiConfig,
    /// Credential checks and session issuance.
    pub auth: AuthService,
    /// Handlers for domain events raised by requests.
    pub events: EventBus,
}

impl AppState {
    /// PHI field cipher.
    pub fn cipher(&self) -> &FieldCipher {
        self.config.security.cipher()
    }
}

/// Run embedded database migrations.
///
/// Delegates to `praxis_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    praxis_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/health", get(health::health))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/logout-all", post(auth::logout_all_handler))
        .route(
            "/patients",
            get(patients::list_patients_handler).post(patients::create_patient_handler),
        )
        .route(
            "/patients/{id}",
            get(patients::get_patient_handler)
                .patch(patients::update_patient_handler)
                .delete(patients::delete_patient_handler),
        )
        .route(
            "/patients/{id}/notes",
            get(notes::list_notes_handler).post(notes::create_note_handler),
        )
        .route(
            "/appointments",
            get(appointments::list_appointments_handler)
                .post(appointments::create_appointment_handler),
        )
        .route(
            "/appointments/{id}",
            get(appointments::get_appointment_handler)
                .delete(appointments::delete_appointment_handler),
        )
        .route(
            "/appointments/{id}/status",
            patch(appointments::update_status_handler),
        )
        .route(
            "/appointments/{id}/pay",
            post(appointments::mark_paid_handler),
        )
        .route(
            "/notes/{id}",
            get(notes::get_note_handler)
                .patch(notes::update_note_handler)
                .delete(notes::delete_note_handler),
        )
        .route(
            "/finance/transactions",
            get(finance::list_transactions_handler).post(finance::create_transaction_handler),
        )
        .route(
            "/finance/transactions/{id}",
            delete(finance::delete_transaction_handler),
        )
        .route("/finance/summary", get(finance::summary_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
