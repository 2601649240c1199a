//! Write-side inputs for the store.
//! Read paths return the public types from `invoicer-types` directly.

use chrono::{DateTime, Utc};
use invoicer_types::ids::InvoiceId;
use rust_decimal::Decimal;

/// Everything needed to insert an invoice together with its wallet.
pub struct NewInvoice<'a> {
    pub id: InvoiceId,
    pub username: &'a str,
    pub created_at: DateTime<Utc>,
    pub address: &'a str,
    pub secret: &'a str,
}

/// Caller-controlled fields of an invoice replacement.
#[derive(Debug, Clone)]
pub struct InvoiceChanges {
    pub id: InvoiceId,
    pub username: String,
    pub total: Decimal,
    pub to: String,
    pub from: String,
    pub description: String,
}
