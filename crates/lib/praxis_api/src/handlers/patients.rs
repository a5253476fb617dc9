//! Patient request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    PatientCreateRequest, PatientList, PatientListQuery, PatientUpdateRequest, PatientView,
};
use crate::services::{auth::clinician_id, patients};
use crate::validation::Validate;

/// `GET /patients`: search by name or email, filter by status, paged.
pub async fn list_patients_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<PatientListQuery>,
) -> AppResult<Json<PatientList>> {
    let clinician = clinician_id(&user.0)?;
    let list = patients::list_patients(&state.pool, state.cipher(), &clinician, query).await?;
    Ok(Json(list))
}

/// `POST /patients`
pub async fn create_patient_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<PatientCreateRequest>,
) -> AppResult<(StatusCode, Json<PatientView>)> {
    let clinician = clinician_id(&user.0)?;
    let input = body.validate()?;
    let patient = patients::create_patient(&state.pool, state.cipher(), &clinician, &input).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /patients/{id}`
pub async fn get_patient_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<PatientView>> {
    let clinician = clinician_id(&user.0)?;
    let patient = patients::get_patient(&state.pool, state.cipher(), &clinician, &id).await?;
    Ok(Json(patient))
}

/// `PATCH /patients/{id}`: omitted fields are kept, `null` clears.
pub async fn update_patient_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<PatientUpdateRequest>,
) -> AppResult<Json<PatientView>> {
    let clinician = clinician_id(&user.0)?;
    let patch = body.validate()?;
    let patient =
        patients::update_patient(&state.pool, state.cipher(), &clinician, &id, patch).await?;
    Ok(Json(patient))
}

/// `DELETE /patients/{id}`: removes appointments and notes with it.
pub async fn delete_patient_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    let clinician = clinician_id(&user.0)?;
    patients::delete_patient(&state.pool, &clinician, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
