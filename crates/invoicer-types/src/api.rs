use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{InvoiceId, SessionToken};
use crate::models::Invoice;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub username: String,
    pub token: SessionToken,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub token: SessionToken,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

// -- Invoices --

/// Full-record replacement payload.
///
/// Clients usually send back the whole invoice they were given, so unknown
/// fields (`paid`, `address`, `created_at`) are accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceInvoiceRequest {
    pub id: InvoiceId,
    pub username: String,
    pub total: Decimal,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub description: String,
}

/// Invoice as returned to clients after reconciliation.
///
/// When the balance oracle could not be reached for this invoice, `paid` is
/// `null` and `reconcile_error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceView {
    pub id: InvoiceId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub paid: Option<Decimal>,
    pub to: String,
    pub from: String,
    pub description: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconcile_error: Option<String>,
}

impl InvoiceView {
    pub fn unreconciled(invoice: Invoice, error: String) -> Self {
        let mut view = Self::from(invoice);
        view.paid = None;
        view.reconcile_error = Some(error);
        view
    }
}

impl From<Invoice> for InvoiceView {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            username: invoice.username,
            created_at: invoice.created_at,
            total: invoice.total,
            paid: Some(invoice.paid),
            to: invoice.to,
            from: invoice.from,
            description: invoice.description,
            address: invoice.address,
            reconcile_error: None,
        }
    }
}
