use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::OnceCell;
use tracing::info;

use invoicer_db::Database;
use invoicer_db::models::{InvoiceChanges, NewInvoice};
use invoicer_oracle::{Reconciled, Reconciler};
use invoicer_types::api::ReplaceInvoiceRequest;
use invoicer_types::ids::{InvoiceId, SessionToken};
use invoicer_types::models::{Invoice, User, Wallet};
use invoicer_wallet::WalletProvisioner;

use crate::error::{LedgerError, Result};

const MAX_USERNAME_LEN: usize = 64;

/// Verified against when the username is unknown, so both rejections cost
/// one Argon2 verification.
const UNKNOWN_USER_PASSWORD: &str = "invoicer-unknown-user";

/// An authenticated identity plus the token that proved it.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: SessionToken,
}

/// The invoicing core: credentials, sessions, invoices, wallets and
/// reconciliation behind one set of typed operations.
pub struct Ledger {
    db: Database,
    wallets: WalletProvisioner,
    reconciler: Reconciler,
    hasher: Argon2<'static>,
    unknown_user_hash: OnceCell<String>,
}

impl Ledger {
    pub fn new(db: Database, wallets: WalletProvisioner, reconciler: Reconciler) -> Self {
        Self {
            db,
            wallets,
            reconciler,
            hasher: Argon2::default(),
            unknown_user_hash: OnceCell::new(),
        }
    }

    /// Replace the Argon2 instance used for new password hashes.
    pub fn with_password_hasher(mut self, hasher: Argon2<'static>) -> Self {
        self.hasher = hasher;
        self.unknown_user_hash = OnceCell::new();
        self
    }

    // -- Credentials & sessions --

    /// Create a user and sign it in with a first session.
    pub async fn register(&self, username: &str, password: &str) -> Result<Session> {
        validate_username(username)?;
        if password.is_empty() {
            return Err(LedgerError::InvalidRequest("Password must not be empty".into()));
        }

        let password_hash = self.hash_password(password).await?;
        let token = SessionToken::generate();
        let user = self
            .db
            .create_user(username, &password_hash, &token, Utc::now())?;

        info!("Registered user {}", user.username);
        Ok(Session { user, token })
    }

    /// Check credentials and open a new, independent session.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        let (password_hash, known) = match self.db.get_password_hash(username)? {
            Some(hash) => (hash, true),
            None => (self.unknown_user_hash().await?, false),
        };

        let verified = self.verify_password(password, password_hash).await?;
        if !known || !verified {
            return Err(LedgerError::InvalidCredentials);
        }

        let token = SessionToken::generate();
        self.db.insert_session(username, &token, Utc::now())?;
        let user = self
            .db
            .get_user_by_token(token.as_str())?
            .ok_or_else(|| LedgerError::Internal(format!("session for {username} vanished")))?;

        info!("User {} signed in", user.username);
        Ok(Session { user, token })
    }

    pub fn resolve_token(&self, token: &str) -> Result<Option<User>> {
        Ok(self.db.get_user_by_token(token)?)
    }

    /// Session gate: classify a presented token as signed in or not.
    pub fn authorize(&self, presented: Option<&str>) -> Result<Session> {
        let token = presented
            .filter(|t| !t.is_empty())
            .ok_or(LedgerError::Unauthenticated)?;
        let user = self
            .resolve_token(token)?
            .ok_or(LedgerError::Unauthenticated)?;

        Ok(Session {
            user,
            token: SessionToken::from(token),
        })
    }

    /// End one session. Revoking an unknown token is not an error.
    pub fn revoke_token(&self, username: &str, token: &SessionToken) -> Result<()> {
        if self.db.delete_session(username, token.as_str())? {
            info!("User {} signed out", username);
        }
        Ok(())
    }

    // -- Invoices --

    /// Provision a wallet, then store it together with a blank invoice.
    /// A provisioning failure leaves the store untouched.
    pub async fn create_invoice(&self, username: &str) -> Result<Invoice> {
        let id = InvoiceId::generate();
        let wallet = self.wallets.provision(username, id).await?;

        let invoice = self.db.create_invoice(&NewInvoice {
            id: wallet.invoice_id,
            username: &wallet.username,
            created_at: Utc::now(),
            address: &wallet.address,
            secret: wallet.secret.expose(),
        })?;

        info!("Created invoice {} for {} at {}", invoice.id, username, invoice.address);
        Ok(invoice)
    }

    /// The caller's invoices, oldest first, each with its observed `paid`.
    pub async fn list_invoices(&self, username: &str) -> Result<Vec<Reconciled>> {
        // The store lock is released before any oracle request starts.
        let invoices = self.db.get_invoices_by_username(username)?;
        Ok(self.reconciler.reconcile(invoices).await)
    }

    /// Raw lookup by primary key, without reconciliation or ownership check.
    pub fn find_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>> {
        Ok(self.db.get_invoice(id)?)
    }

    /// One of the caller's invoices with its observed `paid`.
    pub async fn get_invoice(&self, username: &str, id: &InvoiceId) -> Result<Reconciled> {
        let invoice = self.find_invoice(id)?.ok_or(LedgerError::NotFound(*id))?;
        if invoice.username != username {
            return Err(LedgerError::Unauthorized(*id));
        }
        Ok(self.reconciler.reconcile_one(invoice).await)
    }

    /// Replace an existing invoice's caller-controlled fields.
    pub async fn replace_invoice(
        &self,
        caller: &str,
        request: ReplaceInvoiceRequest,
    ) -> Result<Reconciled> {
        if request.total < Decimal::ZERO {
            return Err(LedgerError::InvalidRequest("Total must not be negative".into()));
        }

        let changes = InvoiceChanges {
            id: request.id,
            username: request.username,
            total: request.total,
            to: request.to,
            from: request.from,
            description: request.description,
        };
        let updated = self.db.replace_invoice(caller, &changes)?;

        info!("Updated invoice {} for {}", updated.id, caller);
        Ok(self.reconciler.reconcile_one(updated).await)
    }

    // -- Wallets --

    pub fn list_wallets(&self, username: &str) -> Result<Vec<Wallet>> {
        Ok(self.db.get_wallets_by_username(username)?)
    }

    // -- Password hashing (CPU-bound, kept off the async workers) --

    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
        })
        .await
        .map_err(|e| LedgerError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| LedgerError::Internal(format!("password hashing failed: {e}")))
    }

    async fn unknown_user_hash(&self) -> Result<String> {
        self.unknown_user_hash
            .get_or_try_init(|| self.hash_password(UNKNOWN_USER_PASSWORD))
            .await
            .cloned()
    }

    async fn verify_password(&self, password: &str, password_hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)?;
            Ok::<_, argon2::password_hash::Error>(
                hasher.verify_password(password.as_bytes(), &parsed).is_ok(),
            )
        })
        .await
        .map_err(|e| LedgerError::Internal(format!("verification task failed: {e}")))?
        .map_err(|e| LedgerError::Internal(format!("stored password hash unreadable: {e}")))
    }
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(LedgerError::InvalidRequest(format!(
            "Username must be 1 to {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(LedgerError::InvalidRequest(
            "Username must not contain whitespace".into(),
        ));
    }
    Ok(())
}
