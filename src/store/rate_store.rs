//! Rate Store
//!
//! SQLite-backed durable cache of exchange rates.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;

use super::{ExchangeRate, InsertOutcome};

/// How long a writer waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS exchange_rates (
        id              INTEGER PRIMARY KEY,
        market_date     TEXT NOT NULL,
        currency_symbol TEXT NOT NULL,
        currency_rate   REAL NOT NULL,
        UNIQUE (market_date, currency_symbol)
    );
";

/// Durable mapping from `(market_date, currency_symbol)` to a rate
///
/// ## Concurrency:
/// - In-process: one connection behind a `Mutex`, all methods take `&self`
/// - Cross-process: SQLite's own locking (WAL journal + busy timeout), so the
///   control shell can `clear` while a server is running
pub struct RateStore {
    /// Database file location
    path: PathBuf,

    /// Single connection shared by all sessions
    conn: Mutex<Connection>,
}

impl RateStore {
    /// Open or create the store at `path`
    ///
    /// Creates the parent directory and the table if they do not exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // journal_mode returns a row, so it cannot go through execute()
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!("Rate store opened at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Look up the cached rate for a key
    pub fn lookup(&self, market_date: &str, currency_symbol: &str) -> Result<Option<f64>> {
        let conn = self.conn.lock();
        let rate = conn
            .query_row(
                "SELECT currency_rate FROM exchange_rates
                 WHERE market_date = ?1 AND currency_symbol = ?2",
                params![market_date, currency_symbol],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rate)
    }

    /// Insert a rate unless one is already cached for the key
    ///
    /// Entries are immutable once written: an existing record is never
    /// overwritten, and the caller should treat `lookup` as the source of
    /// truth after `AlreadyExists`.
    pub fn insert(
        &self,
        market_date: &str,
        currency_symbol: &str,
        currency_rate: f64,
    ) -> Result<InsertOutcome> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO exchange_rates (market_date, currency_symbol, currency_rate)
             VALUES (?1, ?2, ?3)",
            params![market_date, currency_symbol, currency_rate],
        )?;

        Ok(if changed == 0 {
            InsertOutcome::AlreadyExists
        } else {
            InsertOutcome::Inserted
        })
    }

    /// Delete every cached rate in one transaction
    ///
    /// Returns the number of records removed.
    pub fn clear(&self) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM exchange_rates", [])?;
        tx.commit()?;

        tracing::info!("Cleared {} cached rates", removed);
        Ok(removed)
    }

    /// Number of cached rates
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM exchange_rates", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Every cached record, ordered by date then symbol
    pub fn all(&self) -> Result<Vec<ExchangeRate>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, market_date, currency_symbol, currency_rate
             FROM exchange_rates
             ORDER BY market_date, currency_symbol",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ExchangeRate {
                id: row.get(0)?,
                market_date: row.get(1)?,
                currency_symbol: row.get(2)?,
                currency_rate: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
