//! Finance request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    PeriodQuery, SummaryView, TransactionCreateRequest, TransactionListQuery, TransactionView,
};
use crate::services::{auth::clinician_id, finance};
use crate::validation::Validate;

/// `GET /finance/transactions`: optional `from`, `to` (inclusive dates) and `kind`.
pub async fn list_transactions_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> AppResult<Json<Vec<TransactionView>>> {
    let clinician = clinician_id(&user.0)?;
    let list = finance::list_transactions(&state.pool, &clinician, query).await?;
    Ok(Json(list))
}

/// `POST /finance/transactions`
pub async fn create_transaction_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<TransactionCreateRequest>,
) -> AppResult<(StatusCode, Json<TransactionView>)> {
    let clinician = clinician_id(&user.0)?;
    let tx = body.validate()?;
    let entry = finance::create_transaction(&state.pool, &clinician, &tx).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `DELETE /finance/transactions/{id}`
pub async fn delete_transaction_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    let clinician = clinician_id(&user.0)?;
    finance::delete_transaction(&state.pool, &clinician, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /finance/summary`: income, expense and balance for a period.
pub async fn summary_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ApiQuery(period): ApiQuery<PeriodQuery>,
) -> AppResult<Json<SummaryView>> {
    let clinician = clinician_id(&user.0)?;
    let summary = finance::summary(&state.pool, &clinician, period).await?;
    Ok(Json(summary))
}
