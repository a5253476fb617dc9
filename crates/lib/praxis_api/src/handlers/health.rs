//! Liveness endpoint.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health`: reports the version and whether PostgreSQL answers.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_connected = sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .is_ok();

    Json(HealthResponse {
        status: "ok".into(),
        version: praxis_core::version().into(),
        db_connected,
    })
}
