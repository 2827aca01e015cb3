// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and schema
//! initialization.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use cartpulse_core::CartpulseError;
use tokio_rusqlite::Connection;
use tracing::info;

/// Schema applied on every open. Idempotent via IF NOT EXISTS.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS carts (
    cart_id TEXT PRIMARY KEY,
    phone TEXT,
    customer_name TEXT,
    email TEXT,
    shipping_address TEXT,
    items TEXT,
    total_price REAL,
    currency TEXT,
    checkout_url TEXT,
    image_urls TEXT,
    event_updated_at TEXT,
    status TEXT NOT NULL DEFAULT 'Not Contacted',
    note TEXT,
    notification_message_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS undelivered_orders (
    order_id TEXT PRIMARY KEY,
    channel_order_id TEXT,
    customer_name TEXT,
    customer_phone TEXT,
    customer_email TEXT,
    customer_address TEXT,
    customer_city TEXT,
    customer_state TEXT,
    customer_pincode TEXT,
    products TEXT,
    payment_method TEXT,
    total REAL,
    status_text TEXT,
    status_code INTEGER,
    awb TEXT,
    courier_name TEXT,
    order_date TEXT,
    channel_id INTEGER,
    seller_status TEXT NOT NULL DEFAULT 'Not Contacted',
    seller_note TEXT,
    notification_message_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Handle to the Cartpulse SQLite database.
///
/// `Connection` is a cheap clone (a handle to the background worker), so
/// stores each hold their own clone of the same underlying connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if necessary) the database at `path` and applies
    /// the schema. Parent directories are created as needed.
    pub async fn open(path: &Path, wal_mode: bool) -> Result<Self, CartpulseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CartpulseError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| storage_err(tokio_rusqlite::Error::from(e)))?;
        init(&conn, wal_mode).await?;
        info!(path = %path.display(), wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Opens an in-memory database with the schema applied. Test use.
    pub async fn open_in_memory() -> Result<Self, CartpulseError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| storage_err(tokio_rusqlite::Error::from(e)))?;
        init(&conn, false).await?;
        Ok(Self { conn })
    }

    /// Returns a clone of the underlying connection handle.
    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }
}

async fn init(conn: &Connection, wal_mode: bool) -> Result<(), CartpulseError> {
    conn.call(move |conn| {
        if wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    })
    .await
    .map_err(storage_err)
}

/// Helper to convert tokio_rusqlite errors into CartpulseError::Storage.
pub(crate) fn storage_err(e: tokio_rusqlite::Error) -> CartpulseError {
    CartpulseError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_applies_schema() {
        let db = Database::open_in_memory().await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                let count = conn.query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('carts', 'undelivered_orders')",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cartpulse.db");
        let db = Database::open(&path, true).await.unwrap();
        drop(db);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cartpulse.db");
        let db = Database::open(&path, true).await.unwrap();
        drop(db);
        // Second open re-applies the schema without error.
        Database::open(&path, true).await.unwrap();
    }
}
