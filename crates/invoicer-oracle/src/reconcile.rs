use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use invoicer_types::models::Invoice;
use thiserror::Error;
use tracing::{debug, warn};

use crate::oracle::{BalanceOracle, OracleError};

/// Outcome for one invoice: enriched with its observed balance, or the reason
/// it could not be.
pub type Reconciled = Result<Invoice, ReconcileError>;

/// Failure to observe an invoice's payment. Carries the invoice so callers can
/// still show it, without a `paid` value they could mistake for real.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("balance lookup failed for invoice {}: {source}", .invoice.id)]
    Oracle {
        invoice: Box<Invoice>,
        #[source]
        source: OracleError,
    },

    #[error("balance lookup for invoice {} timed out after {timeout:?}", .invoice.id)]
    Timeout {
        invoice: Box<Invoice>,
        timeout: Duration,
    },
}

impl ReconcileError {
    pub fn invoice(&self) -> &Invoice {
        match self {
            Self::Oracle { invoice, .. } | Self::Timeout { invoice, .. } => &**invoice,
        }
    }

    pub fn into_invoice(self) -> Invoice {
        match self {
            Self::Oracle { invoice, .. } | Self::Timeout { invoice, .. } => *invoice,
        }
    }
}

/// Merges externally observed payment state into invoice snapshots.
///
/// Works on owned snapshots only: nothing here touches the store, so no lock
/// is held while oracle requests are in flight, and `paid` is never written
/// back.
#[derive(Clone)]
pub struct Reconciler {
    oracle: Arc<dyn BalanceOracle>,
    timeout: Duration,
}

impl Reconciler {
    pub fn new(oracle: Arc<dyn BalanceOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Query the oracle for every invoice concurrently. Results come back in
    /// input order, one per invoice; a failure affects only its own entry.
    pub async fn reconcile(&self, invoices: Vec<Invoice>) -> Vec<Reconciled> {
        join_all(invoices.into_iter().map(|invoice| self.reconcile_one(invoice))).await
    }

    pub async fn reconcile_one(&self, mut invoice: Invoice) -> Reconciled {
        let lookup = tokio::time::timeout(self.timeout, self.oracle.get_balance(&invoice.address));
        let outcome = lookup.await;

        match outcome {
            Ok(Ok(balance)) => {
                debug!("Invoice {} at {} has {}", invoice.id, invoice.address, balance);
                invoice.paid = balance;
                Ok(invoice)
            }
            Ok(Err(source)) => {
                warn!("Balance lookup for {} failed: {}", invoice.address, source);
                Err(ReconcileError::Oracle {
                    invoice: Box::new(invoice),
                    source,
                })
            }
            Err(_) => {
                warn!("Balance lookup for {} timed out after {:?}", invoice.address, self.timeout);
                Err(ReconcileError::Timeout {
                    invoice: Box::new(invoice),
                    timeout: self.timeout,
                })
            }
        }
    }
}
