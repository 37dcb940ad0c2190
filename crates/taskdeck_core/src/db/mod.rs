//! SQLite backing for the key-value blob store.
//!
//! # Responsibility
//! - Open connections that hold the `kv_store` table.
//! - Bring the schema to the latest migration before any blob access.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening, migrating or querying the blob database.
#[derive(Debug)]
pub enum DbError {
    /// The database at `target` could not be opened.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// Migration `version` failed; the schema stays at its previous version.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open blob database `{target}`: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "blob database migration {version} failed: {source}")
            }
            Self::Sqlite(err) => write!(f, "blob database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "blob database was written by a newer build (schema {db_version}, this build supports up to {latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
