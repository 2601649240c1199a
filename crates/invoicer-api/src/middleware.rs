//! Session gate for protected routes.
//!
//! The gate only decides signed-in or not. What a rejection looks like is
//! chosen per route: API routes get a 401, page routes a redirect to sign-in.
//! Both clear the client's session cookie.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use invoicer_types::ids::SessionToken;

use crate::auth::AppState;
use crate::error::LedgerError;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Where rejected page requests are sent.
pub const SIGN_IN_PATH: &str = "/signin";

/// Token from the session cookie, else from `Authorization: Bearer`.
pub fn presented_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        })
}

pub fn session_cookie(token: &SessionToken) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token.as_str().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
}

/// `302 Found` to `location`.
pub fn found(location: &'static str) -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, location)])
}

/// Gate for API routes: unauthenticated requests get `401`.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let presented = presented_token(&jar, req.headers());

    match state.authorize(presented.as_deref()) {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(err) => (clear_session_cookie(jar), err).into_response(),
    }
}

/// Gate for page routes: unauthenticated requests are sent to sign-in.
pub async fn require_session_or_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let presented = presented_token(&jar, req.headers());

    match state.authorize(presented.as_deref()) {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(LedgerError::Unauthenticated) => {
            (clear_session_cookie(jar), found(SIGN_IN_PATH)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
