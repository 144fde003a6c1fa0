// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Byte-keyed database backends and atomic write batches.
//!
//! [`SqliteDatabase`] is the durable backend: a single WAL-mode connection
//! behind a mutex, so every read and write is serialized through one handle.
//! [`MemoryDatabase`] keeps the same ordering semantics in a `BTreeMap` for
//! tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use apm_core::ApmError;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

/// A raw key/value pair as returned by prefix iteration.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// One staged mutation. Keys are fully resolved against the root database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Mutations applied together by [`Database::write`], all or nothing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { key, value });
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { key });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

/// Ordered, byte-keyed, durable store.
pub trait Database: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ApmError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), ApmError>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), ApmError>;

    fn has(&self, key: &[u8]) -> Result<bool, ApmError> {
        Ok(self.get(key)?.is_some())
    }

    /// Returns every pair whose key starts with `prefix`, in key order.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<KvPair>, ApmError>;

    /// Applies `batch` atomically.
    fn write(&self, batch: WriteBatch) -> Result<(), ApmError>;

    /// Adds a put to `batch`, resolving `key` the same way [`Database::put`]
    /// would.
    fn stage_put(&self, batch: &mut WriteBatch, key: &[u8], value: Vec<u8>) {
        batch.put(key.to_vec(), value);
    }

    fn stage_delete(&self, batch: &mut WriteBatch, key: &[u8]) {
        batch.delete(key.to_vec());
    }
}

/// Smallest byte string greater than every string starting with `prefix`,
/// or `None` when no such bound exists (empty or all-`0xff` prefix).
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut bound = prefix.to_vec();
    while let Some(last) = bound.pop() {
        if last < u8::MAX {
            bound.push(last + 1);
            return Some(bound);
        }
    }
    None
}

fn sql_err(context: &'static str) -> impl Fn(rusqlite::Error) -> ApmError {
    move |e| ApmError::storage(context, e)
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> ApmError {
    ApmError::Internal(format!("database lock poisoned: {e}"))
}

/// SQLite-backed registry database.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Opens (or creates) the database file at `path`, enabling WAL mode and
    /// applying pending migrations.
    pub fn open(path: &Path) -> Result<Self, ApmError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApmError::storage(format!("cannot create {}", parent.display()), e)
            })?;
        }
        let conn = Connection::open(path).map_err(sql_err("failed to open registry database"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(sql_err("failed to enable WAL mode"))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(sql_err("failed to set synchronous mode"))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(sql_err("failed to set busy timeout"))?;
        let db = Self::init(conn)?;
        debug!(path = %path.display(), "registry database opened");
        Ok(db)
    }

    /// Opens a private in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self, ApmError> {
        let conn =
            Connection::open_in_memory().map_err(sql_err("failed to open in-memory database"))?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self, ApmError> {
        crate::migrations::run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApmError> {
        self.conn.lock().map_err(poisoned)
    }
}

impl Database for SqliteDatabase {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ApmError> {
        self.conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(sql_err("failed to read key"))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), ApmError> {
        self.conn()?
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(sql_err("failed to write key"))?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), ApmError> {
        self.conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(sql_err("failed to delete key"))?;
        Ok(())
    }

    fn has(&self, key: &[u8]) -> Result<bool, ApmError> {
        self.conn()?
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM kv WHERE key = ?1)",
                params![key],
                |row| row.get(0),
            )
            .map_err(sql_err("failed to check key"))
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<KvPair>, ApmError> {
        let conn = self.conn()?;
        let map_row =
            |row: &rusqlite::Row<'_>| -> rusqlite::Result<KvPair> { Ok((row.get(0)?, row.get(1)?)) };
        let rows = match prefix_upper_bound(prefix) {
            Some(upper) => {
                let mut stmt = conn
                    .prepare("SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 ORDER BY key")
                    .map_err(sql_err("failed to prepare scan"))?;
                stmt.query_map(params![prefix, upper], map_row)
                    .and_then(|rows| rows.collect::<Result<Vec<KvPair>, _>>())
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key")
                    .map_err(sql_err("failed to prepare scan"))?;
                stmt.query_map(params![prefix], map_row)
                    .and_then(|rows| rows.collect::<Result<Vec<KvPair>, _>>())
            }
        };
        rows.map_err(sql_err("failed to scan keys"))
    }

    fn write(&self, batch: WriteBatch) -> Result<(), ApmError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(sql_err("failed to begin batch"))?;
        for op in &batch.ops {
            let applied = match op {
                BatchOp::Put { key, value } => tx.execute(
                    "INSERT INTO kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                ),
                BatchOp::Delete { key } => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", params![key])
                }
            };
            applied.map_err(sql_err("failed to apply batch operation"))?;
        }
        tx.commit().map_err(sql_err("failed to commit batch"))?;
        debug!(ops = batch.len(), "batch committed");
        Ok(())
    }
}

/// Ordered in-memory database.
#[derive(Default)]
pub struct MemoryDatabase {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across every namespace.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, ApmError> {
        self.entries.lock().map_err(poisoned)
    }
}

impl Database for MemoryDatabase {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ApmError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), ApmError> {
        self.entries()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), ApmError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<KvPair>, ApmError> {
        Ok(self
            .entries()?
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write(&self, batch: WriteBatch) -> Result<(), ApmError> {
        let mut entries = self.entries()?;
        for op in batch.ops {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}
