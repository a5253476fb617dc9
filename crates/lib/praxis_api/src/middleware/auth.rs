//! Authentication middleware: access token from cookie or bearer header.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use praxis_core::models::auth::AccessTokenClaims;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_COOKIE;

/// Key used to store the verified claims in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AccessTokenClaims);

/// Pull the access token from the `access_token` cookie, falling back to
/// `Authorization: Bearer <token>`.
pub fn access_token_from(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Axum middleware: verifies the access token and injects
/// `AuthenticatedUser` into request extensions.
///
/// Missing, expired and badly signed tokens all get the same 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let unauthorized = || AppError::Unauthorized("Authentication required".into());

    let token = access_token_from(request.headers()).ok_or_else(unauthorized)?;
    let claims = state.auth.keys().verify(&token).ok_or_else(|| {
        debug!("rejected access token");
        unauthorized()
    })?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    use super::*;

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; access_token=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(access_token_from(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(access_token_from(&headers).as_deref(), Some("from-header"));

        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(access_token_from(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(access_token_from(&headers), None);
        assert_eq!(access_token_from(&HeaderMap::new()), None);
    }
}
