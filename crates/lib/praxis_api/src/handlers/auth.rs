//! Authentication request handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use praxis_core::auth::service::SessionTokens;
use praxis_core::models::auth::UserView;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, deserialize_field_error};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AuthResponse, LoginRequest, LogoutAllResponse, LogoutResponse, RefreshRequest,
    RegisterRequest,
};
use crate::services::{auth, cookies};
use crate::validation::Validate;

fn session_response(
    state: &AppState,
    jar: CookieJar,
    tokens: SessionTokens,
) -> (CookieJar, Json<AuthResponse>) {
    let jar = cookies::with_session(
        jar,
        &tokens.access_token,
        &tokens.refresh_token,
        state.config.cookie_secure,
    );
    (jar, Json(AuthResponse::from(tokens)))
}

/// Refresh and logout accept an empty body.
fn optional_refresh_body(body: &Bytes) -> AppResult<RefreshRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RefreshRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => {
            AppError::from(vec![deserialize_field_error(&e.to_string(), "body")])
        }
        _ => AppError::invalid("Request body is not valid JSON"),
    })
}

/// `POST /auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let credentials = body.validate()?;
    let tokens = auth::login(&state.auth, credentials).await?;
    Ok(session_response(&state, jar, tokens))
}

/// `POST /auth/register`: create a clinician account and log it in.
pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let registration = body.validate()?;
    let tokens = state.auth.register(registration).await?;
    Ok(session_response(&state, jar, tokens))
}

/// `POST /auth/refresh`: rotate the refresh token and issue a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let body = optional_refresh_body(&body)?;
    let raw = auth::refresh_token_from(&jar, &body)
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".into()))?;
    let tokens = state.auth.refresh_access_token(&raw).await?;
    Ok(session_response(&state, jar, tokens))
}

/// `POST /auth/logout`: revoke the refresh token and clear cookies.
///
/// Succeeds whether or not a token was presented.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<LogoutResponse>)> {
    let body = optional_refresh_body(&body)?;
    if let Some(raw) = auth::refresh_token_from(&jar, &body) {
        state.auth.revoke_refresh_token(&raw).await?;
    }
    let jar = cookies::cleared(jar, state.config.cookie_secure);
    Ok((jar, Json(LogoutResponse { success: true })))
}

/// `GET /auth/me`: the authenticated account.
pub async fn me_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<UserView>> {
    let user_id = auth::user_id(&user.0)?;
    let view = state
        .auth
        .current_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;
    Ok(Json(view))
}

/// `POST /auth/logout-all`: revoke every refresh token of the caller.
pub async fn logout_all_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<LogoutAllResponse>)> {
    let user_id = auth::user_id(&user.0)?;
    let revoked = state.auth.revoke_all_for_user(user_id).await?;
    let jar = cookies::cleared(jar, state.config.cookie_secure);
    Ok((jar, Json(LogoutAllResponse { revoked })))
}
