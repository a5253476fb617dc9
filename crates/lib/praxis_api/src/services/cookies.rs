//! Auth cookies: set on login, register and refresh, cleared on logout.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use praxis_core::auth::jwt::ACCESS_TOKEN_EXPIRY_SECS;
use praxis_core::auth::refresh::REFRESH_TOKEN_EXPIRY_DAYS;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";
/// The refresh cookie is only sent to the auth endpoints.
pub const REFRESH_COOKIE_PATH: &str = "/auth";

fn build(
    name: &'static str,
    value: String,
    path: &'static str,
    secure: bool,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(path)
        .max_age(max_age)
        .build()
}

/// httpOnly cookie for the access token (15 minutes).
pub fn access_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(
        ACCESS_COOKIE,
        token.to_string(),
        "/",
        secure,
        Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS),
    )
}

/// httpOnly cookie for the refresh token (7 days, `/auth` only).
pub fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(
        REFRESH_COOKIE,
        token.to_string(),
        REFRESH_COOKIE_PATH,
        secure,
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
    )
}

/// Add both session cookies to `jar`.
pub fn with_session(
    jar: CookieJar,
    access_token: &str,
    refresh_token: &str,
    secure: bool,
) -> CookieJar {
    jar.add(access_cookie(access_token, secure))
        .add(refresh_cookie(refresh_token, secure))
}

/// Replace both session cookies with expired ones.
pub fn cleared(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(build(ACCESS_COOKIE, String::new(), "/", secure, Duration::ZERO))
        .add(build(
            REFRESH_COOKIE,
            String::new(),
            REFRESH_COOKIE_PATH,
            secure,
            Duration::ZERO,
        ))
}
