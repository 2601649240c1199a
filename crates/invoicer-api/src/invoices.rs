use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use invoicer_oracle::{ReconcileError, Reconciled};
use invoicer_types::api::{InvoiceView, ReplaceInvoiceRequest};
use invoicer_types::ids::InvoiceId;

use crate::auth::AppState;
use crate::error::LedgerError;
use crate::ledger::Session;

/// A failed reconciliation is shown with `paid: null` plus a fixed reason.
/// The underlying oracle error was already logged by the reconciler.
fn view(reconciled: Reconciled) -> InvoiceView {
    match reconciled {
        Ok(invoice) => invoice.into(),
        Err(err) => {
            let reason = reconcile_message(&err);
            InvoiceView::unreconciled(err.into_invoice(), reason.into())
        }
    }
}

fn reconcile_message(err: &ReconcileError) -> &'static str {
    match err {
        ReconcileError::Oracle { .. } => "balance lookup failed",
        ReconcileError::Timeout { .. } => "balance lookup timed out",
    }
}

/// POST /create, POST /api/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, LedgerError> {
    info!("/create {}", session.user.username);

    let invoice = state.create_invoice(&session.user.username).await?;
    Ok((StatusCode::CREATED, Json(InvoiceView::from(invoice))))
}

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<InvoiceView>>, LedgerError> {
    let invoices = state.list_invoices(&session.user.username).await?;
    Ok(Json(invoices.into_iter().map(view).collect()))
}

/// GET /api/invoices/{id}
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Extension(session): Extension<Session>,
) -> Result<Json<InvoiceView>, LedgerError> {
    let invoice = state.get_invoice(&session.user.username, &id).await?;
    Ok(Json(view(invoice)))
}

/// PUT /api/invoices/{id}: replace the whole invoice.
pub async fn replace_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Extension(session): Extension<Session>,
    Json(req): Json<ReplaceInvoiceRequest>,
) -> Result<Json<InvoiceView>, LedgerError> {
    if req.id != id {
        return Err(LedgerError::InvalidRequest(
            "Invoice id in body does not match the URL".into(),
        ));
    }

    info!("/api/invoices/{} update by {}", id, session.user.username);

    let invoice = state.replace_invoice(&session.user.username, req).await?;
    Ok(Json(view(invoice)))
}
