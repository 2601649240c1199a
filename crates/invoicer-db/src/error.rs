use invoicer_types::ids::InvoiceId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    #[error("invoice not found: {0}")]
    NotFound(InvoiceId),

    /// The caller tried to write an invoice it does not own.
    #[error("invoice {0} is not owned by the caller")]
    Unauthorized(InvoiceId),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
