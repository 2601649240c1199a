use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use invoicer_types::api::{RegisterRequest, RegisterResponse, SignInRequest, SignInResponse};

use crate::error::LedgerError;
use crate::ledger::{Ledger, Session};
use crate::middleware::{clear_session_cookie, found, session_cookie};

pub type AppState = Arc<Ledger>;

/// POST /signup: create an account and start its first session.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    info!("/signup {}", req.username);

    let session = state.register(&req.username, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&session.token)),
        Json(RegisterResponse {
            username: session.user.username,
            token: session.token,
        }),
    ))
}

/// POST /signin: start an additional session for an existing account.
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    info!("/signin {}", req.username);

    let session = state.authenticate(&req.username, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&session.token)),
        Json(SignInResponse {
            token: session.token,
        }),
    ))
}

/// GET /signout: revoke the presented session only.
pub async fn signout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> Result<impl IntoResponse, LedgerError> {
    info!("/signout {}", session.user.username);

    state.revoke_token(&session.user.username, &session.token)?;

    Ok((clear_session_cookie(jar), found("/")))
}
