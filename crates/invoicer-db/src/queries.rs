use std::str::FromStr;

use chrono::{DateTime, Utc};
use invoicer_types::ids::{InvoiceId, SessionToken};
use invoicer_types::models::{Invoice, User, Wallet};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::models::{InvoiceChanges, NewInvoice};
use crate::{Database, DbError, Result};

const INVOICE_COLUMNS: &str =
    "id, username, created_at, total, to_name, from_name, description, address";

impl Database {
    // -- Users & sessions --

    /// Insert a user together with its first session.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<User> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            if taken {
                return Err(DbError::DuplicateUsername(username.to_string()));
            }

            tx.execute(
                "INSERT INTO users (username, password, created_at) VALUES (?1, ?2, ?3)",
                params![username, password_hash, now],
            )?;
            tx.execute(
                "INSERT INTO sessions (token, username, created_at) VALUES (?1, ?2, ?3)",
                params![token.as_str(), username, now],
            )?;
            tx.commit()?;

            Ok(User {
                username: username.to_string(),
                created_at: now,
            })
        })
    }

    /// Stored password hash for `username`, if the user exists.
    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let hash = conn
                .query_row(
                    "SELECT password FROM users WHERE username = ?1",
                    [username],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(hash)
        })
    }

    pub fn insert_session(
        &self,
        username: &str,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, username, created_at) VALUES (?1, ?2, ?3)",
                params![token.as_str(), username, now],
            )?;
            Ok(())
        })
    }

    /// The user whose session set contains `token`, if any.
    pub fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT u.username, u.created_at
                     FROM sessions s
                     JOIN users u ON u.username = s.username
                     WHERE s.token = ?1",
                    [token],
                    |row| {
                        Ok(User {
                            username: row.get(0)?,
                            created_at: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Remove one session. Removing an absent session is a no-op.
    /// Returns whether a session was actually removed.
    pub fn delete_session(&self, username: &str, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM sessions WHERE token = ?1 AND username = ?2",
                [token, username],
            )?;
            Ok(removed > 0)
        })
    }

    // -- Invoices & wallets --

    /// Insert an invoice and its wallet atomically. Either both rows exist
    /// afterwards or neither does.
    pub fn create_invoice(&self, new: &NewInvoice<'_>) -> Result<Invoice> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = new.id.to_string();

            tx.execute(
                "INSERT INTO invoices (id, username, created_at, address) VALUES (?1, ?2, ?3, ?4)",
                params![id, new.username, new.created_at, new.address],
            )?;
            tx.execute(
                "INSERT INTO wallets (invoice_id, username, address, secret) VALUES (?1, ?2, ?3, ?4)",
                params![id, new.username, new.address, new.secret],
            )?;

            let invoice = query_invoice(&tx, &new.id)?.ok_or(DbError::NotFound(new.id))?;
            tx.commit()?;
            Ok(invoice)
        })
    }

    /// All invoices owned by `username`, oldest first.
    pub fn get_invoices_by_username(&self, username: &str) -> Result<Vec<Invoice>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INVOICE_COLUMNS} FROM invoices WHERE username = ?1 ORDER BY rowid"
            ))?;
            let rows = stmt
                .query_map([username], invoice_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>> {
        self.with_conn(|conn| query_invoice(conn, id))
    }

    /// Replace the caller-controlled fields of an existing invoice.
    ///
    /// `id`, `address` and `created_at` always keep their stored values. The
    /// payload must name `caller` as owner and the stored invoice must belong
    /// to `caller`; an unknown id is `NotFound`, never an insert.
    pub fn replace_invoice(&self, caller: &str, changes: &InvoiceChanges) -> Result<Invoice> {
        self.with_conn(|conn| {
            if changes.username != caller {
                return Err(DbError::Unauthorized(changes.id));
            }

            let existing = query_invoice(conn, &changes.id)?.ok_or(DbError::NotFound(changes.id))?;
            if existing.username != caller {
                return Err(DbError::Unauthorized(changes.id));
            }

            conn.execute(
                "UPDATE invoices
                 SET total = ?1, to_name = ?2, from_name = ?3, description = ?4
                 WHERE id = ?5",
                params![
                    changes.total.to_string(),
                    changes.to,
                    changes.from,
                    changes.description,
                    changes.id.to_string(),
                ],
            )?;

            query_invoice(conn, &changes.id)?.ok_or(DbError::NotFound(changes.id))
        })
    }

    /// Wallets owned by `username`, oldest first. The secret column is never read.
    pub fn get_wallets_by_username(&self, username: &str) -> Result<Vec<Wallet>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT invoice_id, username, address FROM wallets WHERE username = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([username], |row| {
                    Ok(Wallet {
                        invoice_id: parse_column(row, 0)?,
                        username: row.get(1)?,
                        address: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_invoice(conn: &Connection, id: &InvoiceId) -> Result<Option<Invoice>> {
    let invoice = conn
        .query_row(
            &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"),
            [id.to_string()],
            invoice_from_row,
        )
        .optional()?;
    Ok(invoice)
}

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: parse_column(row, 0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
        total: parse_column(row, 3)?,
        paid: Decimal::ZERO,
        to: row.get(4)?,
        from: row.get(5)?,
        description: row.get(6)?,
        address: row.get(7)?,
    })
}

/// Read a TEXT column and parse it into a typed value.
fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
