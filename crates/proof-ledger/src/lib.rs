#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! An append-only hash chain binding proof runs to capsule hashes, backed by
//! a single-table SQLite store.
//!
//! Event sequence (high-level): ledger.open → ledger.append (single writer)
//! → ledger.verify / ledger.bind (many readers)

use parking_lot::Mutex;
use proof_canon::sha256_hex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// The genesis `prev_hash`: 64 ASCII zeroes.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

const GENESIS: &str = GENESIS_HASH;

/// Errors raised by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The underlying SQLite store rejected an operation.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One row of the ledger, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Monotonic row id, starting at 1.
    pub id: i64,
    /// Unix seconds supplied by the caller at append time.
    pub t_run: i64,
    /// Hex capsule hash this entry binds to.
    pub capsule_hash: String,
    /// Hex `entry_hash` of the previous row, or the genesis value for the first row.
    pub prev_hash: String,
    /// Hex `SHA-256("{prev_hash}|{capsule_hash}|{t_run}")`.
    pub entry_hash: String,
}

/// The outcome of walking the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Every entry's `prev_hash`/`entry_hash` pair checks out and the chain
    /// has at least one entry.
    Valid,
    /// A break was found in the chain, or the chain is empty.
    Invalid,
}

/// A SQLite-backed append-only hash chain.
///
/// Appends are serialized through an internal mutex guarding a single
/// connection; many threads may call [`Ledger::verify`] or
/// [`Ledger::capsule_binding`] concurrently, each reading a consistent
/// snapshot of the table as it stood when the read transaction began.
pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    /// Opens (creating if necessary) the ledger store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Sqlite` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ledger (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                t_run INTEGER NOT NULL,
                capsule_hash TEXT NOT NULL,
                prev_hash TEXT NOT NULL,
                entry_hash TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory ledger, useful for tests and ephemeral bundles
    /// assembled entirely in one process.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Sqlite` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::open(":memory:")
    }

    /// Appends a new entry binding `capsule_hash` at `t_run`.
    ///
    /// The tip read and the insert happen inside one exclusive transaction,
    /// so concurrent appends are serialized and a reader never observes a
    /// half-written entry.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Sqlite` if the transaction fails.
    pub fn append(&self, capsule_hash: &str, t_run: i64) -> Result<LedgerEntry, LedgerError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let prev_hash: String = tx
            .query_row(
                "SELECT entry_hash FROM ledger ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or_else(|| GENESIS.to_string());
        let entry_hash = sha256_hex(format!("{prev_hash}|{capsule_hash}|{t_run}").as_bytes());
        tx.execute(
            "INSERT INTO ledger (t_run, capsule_hash, prev_hash, entry_hash) VALUES (?1, ?2, ?3, ?4)",
            params![t_run, capsule_hash, prev_hash, entry_hash],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(LedgerEntry {
            id,
            t_run,
            capsule_hash: capsule_hash.to_string(),
            prev_hash,
            entry_hash,
        })
    }

    /// Returns the most recently appended entry, if any.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Sqlite` if the query fails.
    pub fn tip(&self) -> Result<Option<LedgerEntry>, LedgerError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, t_run, capsule_hash, prev_hash, entry_hash FROM ledger ORDER BY id DESC LIMIT 1",
            [],
            Self::row_to_entry,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Returns every entry in `id` ascending order.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Sqlite` if the query fails.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, t_run, capsule_hash, prev_hash, entry_hash FROM ledger ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
        Ok(LedgerEntry {
            id: row.get(0)?,
            t_run: row.get(1)?,
            capsule_hash: row.get(2)?,
            prev_hash: row.get(3)?,
            entry_hash: row.get(4)?,
        })
    }

    /// Walks the whole chain in `id` order and checks every link.
    ///
    /// An empty ledger is `Invalid`: a bundle's ledger must contain at
    /// least one entry.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Sqlite` if the query fails.
    pub fn verify(&self) -> Result<VerifyOutcome, LedgerError> {
        let entries = self.entries()?;
        if entries.is_empty() {
            return Ok(VerifyOutcome::Invalid);
        }
        let mut expected = GENESIS.to_string();
        for entry in &entries {
            if entry.prev_hash != expected {
                return Ok(VerifyOutcome::Invalid);
            }
            let recomputed =
                sha256_hex(format!("{expected}|{}|{}", entry.capsule_hash, entry.t_run).as_bytes());
            if recomputed != entry.entry_hash {
                return Ok(VerifyOutcome::Invalid);
            }
            expected = entry.entry_hash.clone();
        }
        Ok(VerifyOutcome::Valid)
    }

    /// Finds the most recent entry whose `capsule_hash` equals `capsule_hash`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Sqlite` if the query fails.
    pub fn capsule_binding(&self, capsule_hash: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, t_run, capsule_hash, prev_hash, entry_hash FROM ledger
             WHERE capsule_hash = ?1 ORDER BY id DESC LIMIT 1",
            params![capsule_hash],
            Self::row_to_entry,
        )
        .optional()
        .map_err(Into::into)
    }
}
