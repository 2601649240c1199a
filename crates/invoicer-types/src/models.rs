use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::InvoiceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A billing record bound 1:1 to a payment wallet.
///
/// `paid` is never stored. It is whatever the balance oracle reported for
/// `address` on the read that produced this snapshot (zero at creation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub paid: Decimal,
    pub to: String,
    pub from: String,
    pub description: String,
    pub address: String,
}

/// Public projection of a payment wallet. The secret key has no field here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub invoice_id: InvoiceId,
    pub username: String,
    pub address: String,
}
