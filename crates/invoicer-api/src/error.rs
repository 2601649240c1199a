use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use invoicer_db::DbError;
use invoicer_types::api::ErrorResponse;
use invoicer_types::ids::InvoiceId;
use invoicer_wallet::KeygenError;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Every failure a ledger operation can report to the transport layer.
///
/// Per-invoice reconciliation failures are not here: they travel alongside
/// the other results (see `invoicer_oracle::ReconcileError`).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("username already taken")]
    DuplicateUsername,

    /// Unknown username or wrong password; deliberately not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not signed in")]
    Unauthenticated,

    #[error("invoice {0} belongs to another user")]
    Unauthorized(InvoiceId),

    #[error("invoice not found: {0}")]
    NotFound(InvoiceId),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("wallet provisioning failed: {0}")]
    WalletProvisioningFailed(#[from] KeygenError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateUsername(_) => Self::DuplicateUsername,
            DbError::NotFound(id) => Self::NotFound(id),
            DbError::Unauthorized(id) => Self::Unauthorized(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl LedgerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateUsername => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::WalletProvisioningFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are logged, not returned.
    fn public_message(&self) -> String {
        match self {
            Self::DuplicateUsername => "Username already taken".into(),
            Self::InvalidCredentials => "Invalid credentials".into(),
            Self::Unauthenticated => "Not signed in".into(),
            Self::Unauthorized(_) => "Not allowed".into(),
            Self::NotFound(_) => "Invoice not found".into(),
            Self::InvalidRequest(reason) => reason.clone(),
            Self::WalletProvisioningFailed(_) => "Could not create a payment wallet".into(),
            Self::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => error!("Internal error: {}", detail),
            Self::WalletProvisioningFailed(source) => warn!("Wallet provisioning failed: {}", source),
            _ => {}
        }

        let body = ErrorResponse {
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
