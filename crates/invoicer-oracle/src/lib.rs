//! Payment observation for invoices.
//!
//! `BalanceOracle` reports what has been received at an address; `Reconciler`
//! fans a batch of invoices out to the oracle and fills in each `paid`.

pub mod oracle;
pub mod reconcile;

pub use oracle::{BalanceOracle, HttpBalanceOracle, OracleError};
pub use reconcile::{ReconcileError, Reconciled, Reconciler};
