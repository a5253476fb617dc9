//! Authentication flows on top of `praxis_core::auth`.

use axum_extra::extract::cookie::CookieJar;
use praxis_core::auth::service::{AuthService, SessionTokens};
use praxis_core::models::auth::AccessTokenClaims;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::RefreshRequest;
use crate::services::cookies::REFRESH_COOKIE;
use crate::validation::Credentials;

/// Check credentials and open a session.
pub async fn login(auth: &AuthService, credentials: Credentials) -> AppResult<SessionTokens> {
    let account = auth
        .validate_user(&credentials.email, &credentials.password)
        .await?;
    Ok(auth.login(&account).await?)
}

/// Refresh token from the cookie, else from the body.
pub fn refresh_token_from(jar: &CookieJar, body: &RefreshRequest) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| body.refresh_token.clone().filter(|t| !t.is_empty()))
}

/// The authenticated user's id.
pub fn user_id(claims: &AccessTokenClaims) -> AppResult<Uuid> {
    claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
}

/// The tenant every practice query is scoped to.
///
/// Accounts without a clinician profile cannot reach practice data.
pub fn clinician_id(claims: &AccessTokenClaims) -> AppResult<Uuid> {
    claims
        .clinician_id
        .ok_or_else(|| AppError::Forbidden("A clinician profile is required".into()))
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::cookie::Cookie;
    use praxis_core::models::auth::Role;

    use super::*;

    fn claims(clinician_id: Option<Uuid>) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: Uuid::now_v7().to_string(),
            email: "ana@clinic.example".into(),
            role: Role::Clinician,
            clinician_id,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn refresh_cookie_takes_precedence() {
        let body = RefreshRequest {
            refresh_token: Some("from-body".into()),
        };
        let jar = CookieJar::new().add(Cookie::new(REFRESH_COOKIE, "from-cookie"));
        assert_eq!(refresh_token_from(&jar, &body).as_deref(), Some("from-cookie"));
        assert_eq!(
            refresh_token_from(&CookieJar::new(), &body).as_deref(),
            Some("from-body")
        );
        assert_eq!(
            refresh_token_from(&CookieJar::new(), &RefreshRequest::default()),
            None
        );
    }

    #[test]
    fn practice_access_needs_a_clinician() {
        let id = Uuid::now_v7();
        assert_eq!(clinician_id(&claims(Some(id))).unwrap(), id);
        assert!(matches!(
            clinician_id(&claims(None)),
            Err(AppError::Forbidden(_))
        ));
        assert!(user_id(&claims(None)).is_ok());
    }
}
