use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            username    TEXT PRIMARY KEY,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            token       TEXT PRIMARY KEY,
            username    TEXT NOT NULL REFERENCES users(username),
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_username
            ON sessions(username);

        -- paid is deliberately absent: it is observed on read, never stored
        CREATE TABLE IF NOT EXISTS invoices (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL REFERENCES users(username),
            created_at  TEXT NOT NULL,
            total       TEXT NOT NULL DEFAULT '0',
            to_name     TEXT NOT NULL DEFAULT '',
            from_name   TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            address     TEXT NOT NULL UNIQUE
        );

        CREATE INDEX IF NOT EXISTS idx_invoices_username
            ON invoices(username);

        CREATE TABLE IF NOT EXISTS wallets (
            invoice_id  TEXT PRIMARY KEY REFERENCES invoices(id),
            username    TEXT NOT NULL REFERENCES users(username),
            address     TEXT NOT NULL UNIQUE,
            secret      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_wallets_username
            ON wallets(username);
        ",
    )?;

    info!("Store migrations complete");
    Ok(())
}
