//! Clinical note request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{NoteCreateRequest, NoteUpdateRequest, NoteView};
use crate::services::{auth::clinician_id, notes};
use crate::validation::Validate;

/// `GET /patients/{id}/notes`: newest first.
pub async fn list_notes_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(patient_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<NoteView>>> {
    let clinician = clinician_id(&user.0)?;
    let list = notes::list_notes(&state.pool, state.cipher(), &clinician, &patient_id).await?;
    Ok(Json(list))
}

/// `POST /patients/{id}/notes`
pub async fn create_note_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NoteCreateRequest>,
) -> AppResult<(StatusCode, Json<NoteView>)> {
    let clinician = clinician_id(&user.0)?;
    let input = body.validate()?;
    let note =
        notes::create_note(&state.pool, state.cipher(), &clinician, &patient_id, input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /notes/{id}`
pub async fn get_note_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<NoteView>> {
    let clinician = clinician_id(&user.0)?;
    let note = notes::get_note(&state.pool, state.cipher(), &clinician, &id).await?;
    Ok(Json(note))
}

/// `PATCH /notes/{id}`
pub async fn update_note_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NoteUpdateRequest>,
) -> AppResult<Json<NoteView>> {
    let clinician = clinician_id(&user.0)?;
    let patch = body.validate()?;
    let note = notes::update_note(&state.pool, state.cipher(), &clinician, &id, patch).await?;
    Ok(Json(note))
}

/// `DELETE /notes/{id}`
pub async fn delete_note_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    let clinician = clinician_id(&user.0)?;
    notes::delete_note(&state.pool, &clinician, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
