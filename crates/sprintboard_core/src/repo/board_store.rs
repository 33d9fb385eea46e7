//! Board store contract and SQLite key-value implementation.
//!
//! # Responsibility
//! - Persist the whole board snapshot as one JSON value under one key.
//! - Keep SQL and JSON encoding details inside the persistence boundary.
//!
//! # Invariants
//! - `save` replaces the entry wholesale; there are no partial writes.
//! - Read paths reject undecodable values instead of masking them.

use crate::db::DbError;
use crate::model::snapshot::BoardSnapshot;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key used by the sprint board for its single entry.
pub const DEFAULT_STORAGE_KEY: &str = "sprint-board-db:v3";

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence error for board snapshot reads and writes.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Snapshot could not be encoded for writing.
    Serialize(serde_json::Error),
    /// Stored value is not a decodable board snapshot.
    InvalidData { key: String, message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to encode board snapshot: {err}"),
            Self::InvalidData { key, message } => {
                write!(f, "invalid board snapshot under `{key}`: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidData { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable key-value home of the board snapshot.
pub trait BoardStore {
    /// Returns the stored snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> StoreResult<Option<BoardSnapshot>>;
    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &BoardSnapshot) -> StoreResult<()>;
}

impl<S: BoardStore + ?Sized> BoardStore for &S {
    fn load(&self) -> StoreResult<Option<BoardSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &BoardSnapshot) -> StoreResult<()> {
        (**self).save(snapshot)
    }
}

/// SQLite-backed board store over the `kv_entries` table.
pub struct SqliteBoardStore<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteBoardStore<'conn> {
    /// Uses `DEFAULT_STORAGE_KEY`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_key(conn, DEFAULT_STORAGE_KEY)
    }

    /// Uses a caller-chosen key, e.g. to keep several boards in one file.
    pub fn with_key(conn: &'conn Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Removes the stored entry. Returns whether one existed.
    pub fn clear(&self) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [self.key.as_str()])?;
        Ok(changed > 0)
    }
}

impl BoardStore for SqliteBoardStore<'_> {
    fn load(&self) -> StoreResult<Option<BoardSnapshot>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| StoreError::InvalidData {
                    key: self.key.clone(),
                    message: err.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &BoardSnapshot) -> StoreResult<()> {
        let encoded = serde_json::to_string(snapshot).map_err(StoreError::Serialize)?;
        self.conn.execute(
            "INSERT INTO kv_entries (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.key.as_str(), encoded],
        )?;
        Ok(())
    }
}
