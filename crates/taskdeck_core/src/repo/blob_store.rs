//! Key-value blob store contract and implementations.
//!
//! # Responsibility
//! - Offer synchronous `get`/`set` of text blobs by key.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `set` either stores the full value or reports failure; no partial writes.
//! - A failed `set` leaves the previously stored value readable.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BlobResult<T> = Result<T, BlobStoreError>;

/// Failures reported by blob store implementations.
#[derive(Debug)]
pub enum BlobStoreError {
    Db(DbError),
    /// The write would exceed the storage quota.
    QuotaExceeded {
        key: String,
        required_bytes: usize,
        limit_bytes: usize,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for BlobStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                key,
                required_bytes,
                limit_bytes,
            } => write!(
                f,
                "storage quota exceeded writing `{key}`: {required_bytes} bytes needed, limit {limit_bytes}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "blob store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "blob store requires table `{table}`")
            }
        }
    }
}

impl Error for BlobStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for BlobStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BlobStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous text blob storage addressed by key.
pub trait BlobStore {
    fn get(&self, key: &str) -> BlobResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> BlobResult<()>;
}

/// Process-local blob store with an optional byte quota.
///
/// The quota counts key and value bytes across all entries, mirroring how
/// browser storage enforces its limit.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: HashMap<String, String>,
    limit_bytes: Option<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(limit_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            limit_bytes: Some(limit_bytes),
        }
    }

    /// Seeds an entry directly, bypassing the quota.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn set_quota(&mut self, limit_bytes: Option<usize>) {
        self.limit_bytes = limit_bytes;
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| existing.len() + value.len())
            .sum()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> BlobResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> BlobResult<()> {
        if let Some(limit_bytes) = self.limit_bytes {
            let required_bytes = self.used_bytes_without(key) + key.len() + value.len();
            if required_bytes > limit_bytes {
                return Err(BlobStoreError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    limit_bytes,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed blob store over the `kv_store` table.
pub struct SqliteBlobStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlobStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when `kv_store` is absent.
    pub fn try_new(conn: &'conn Connection) -> BlobResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(BlobStoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(BlobStoreError::MissingRequiredTable("kv_store"));
        }

        Ok(Self { conn })
    }
}

impl BlobStore for SqliteBlobStore<'_> {
    fn get(&self, key: &str) -> BlobResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> BlobResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BlobStore, BlobStoreError, MemoryBlobStore};

    #[test]
    fn memory_store_overwrites_existing_key() {
        let mut store = MemoryBlobStore::new();
        store.set("projects", "[]").unwrap();
        store.set("projects", "[1]").unwrap();
        assert_eq!(store.get("projects").unwrap().as_deref(), Some("[1]"));
        assert!(store.get("darkMode").unwrap().is_none());
    }

    #[test]
    fn memory_store_quota_rejects_oversized_write_and_keeps_old_value() {
        let mut store = MemoryBlobStore::with_quota(16);
        store.set("projects", "[]").unwrap();

        let err = store.set("projects", "[\"way too long\"]").unwrap_err();
        assert!(matches!(
            err,
            BlobStoreError::QuotaExceeded { limit_bytes: 16, .. }
        ));
        assert_eq!(store.get("projects").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn memory_store_quota_ignores_replaced_value_size() {
        let mut store = MemoryBlobStore::with_quota(12);
        store.set("k", "0123456789").unwrap();
        store.set("k", "9876543210").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("9876543210"));
    }
}
