pub mod auth;
pub mod error;
pub mod invoices;
pub mod ledger;
pub mod middleware;
pub mod router;
pub mod wallets;

pub use error::LedgerError;
pub use ledger::{Ledger, Session};
