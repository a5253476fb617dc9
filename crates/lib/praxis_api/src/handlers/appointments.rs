//! Scheduling request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AppointmentCreateRequest, AppointmentListQuery, AppointmentStatusRequest, AppointmentView,
};
use crate::services::{appointments, auth::clinician_id};
use crate::validation::Validate;

/// `GET /appointments`: optional `from`, `to` and `patientId` filters.
pub async fn list_appointments_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<AppointmentListQuery>,
) -> AppResult<Json<Vec<AppointmentView>>> {
    let clinician = clinician_id(&user.0)?;
    let list = appointments::list_appointments(&state.pool, &clinician, query).await?;
    Ok(Json(list))
}

/// `POST /appointments`
pub async fn create_appointment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<AppointmentCreateRequest>,
) -> AppResult<(StatusCode, Json<AppointmentView>)> {
    let clinician = clinician_id(&user.0)?;
    let input = body.validate()?;
    let appointment = appointments::create_appointment(&state.pool, &clinician, input).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `GET /appointments/{id}`
pub async fn get_appointment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<AppointmentView>> {
    let clinician = clinician_id(&user.0)?;
    let appointment = appointments::get_appointment(&state.pool, &clinician, &id).await?;
    Ok(Json(appointment))
}

/// `PATCH /appointments/{id}/status`
pub async fn update_status_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AppointmentStatusRequest>,
) -> AppResult<Json<AppointmentView>> {
    let clinician = clinician_id(&user.0)?;
    let status = body.validate()?;
    let appointment = appointments::update_status(&state.pool, &clinician, &id, status).await?;
    Ok(Json(appointment))
}

/// `POST /appointments/{id}/pay`: records income in the ledger.
pub async fn mark_paid_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<AppointmentView>> {
    let clinician = clinician_id(&user.0)?;
    let appointment = appointments::mark_paid(&state.pool, &state.events, &clinician, &id).await?;
    Ok(Json(appointment))
}

/// `DELETE /appointments/{id}`
pub async fn delete_appointment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    let clinician = clinician_id(&user.0)?;
    appointments::delete_appointment(&state.pool, &clinician, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
