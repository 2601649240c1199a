use axum::{Extension, Json, extract::State};

use invoicer_types::models::Wallet;

use crate::auth::AppState;
use crate::error::LedgerError;
use crate::ledger::Session;

/// GET /api/wallets: the caller's payment addresses. Secrets are not part
/// of the `Wallet` type, so they cannot end up here.
pub async fn list_wallets(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Wallet>>, LedgerError> {
    Ok(Json(state.list_wallets(&session.user.username)?))
}
