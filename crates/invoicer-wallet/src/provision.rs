use std::sync::Arc;

use invoicer_types::ids::InvoiceId;
use tracing::debug;

use crate::keys::{KeyGenerator, KeygenError, SecretKey};

/// A freshly generated wallet, not yet persisted.
#[derive(Debug)]
pub struct ProvisionedWallet {
    pub invoice_id: InvoiceId,
    pub username: String,
    pub address: String,
    pub secret: SecretKey,
}

/// Binds newly generated key pairs to invoices.
///
/// Address uniqueness rests on the generator's keyspace; the store's UNIQUE
/// constraint catches the astronomically unlikely collision.
#[derive(Clone)]
pub struct WalletProvisioner {
    keygen: Arc<dyn KeyGenerator>,
}

impl WalletProvisioner {
    pub fn new(keygen: Arc<dyn KeyGenerator>) -> Self {
        Self { keygen }
    }

    pub async fn provision(
        &self,
        username: &str,
        invoice_id: InvoiceId,
    ) -> Result<ProvisionedWallet, KeygenError> {
        let pair = self.keygen.generate_key_pair().await?;
        debug!("Provisioned wallet {} for invoice {}", pair.address, invoice_id);

        Ok(ProvisionedWallet {
            invoice_id,
            username: username.to_string(),
            address: pair.address,
            secret: pair.secret,
        })
    }
}
