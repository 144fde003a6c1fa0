// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed record stores over a byte-keyed [`Database`].

use std::marker::PhantomData;
use std::sync::Arc;

use apm_core::ApmError;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::database::{Database, KvPair, WriteBatch};

/// A store of `T` records addressed by byte keys.
pub trait Storage<T> {
    fn get(&self, key: &[u8]) -> Result<Option<T>, ApmError>;

    fn put(&self, key: &[u8], value: &T) -> Result<(), ApmError>;

    fn delete(&self, key: &[u8]) -> Result<(), ApmError>;

    fn has(&self, key: &[u8]) -> Result<bool, ApmError>;

    /// Snapshot of every record in key order. Values decode on access.
    fn iter(&self) -> Result<Iter<T>, ApmError>;

    /// Encodes `value` and adds it to `batch` without touching the store.
    fn stage_put(&self, batch: &mut WriteBatch, key: &[u8], value: &T) -> Result<(), ApmError>;

    fn stage_delete(&self, batch: &mut WriteBatch, key: &[u8]);

    /// Applies a batch built from any stores sharing this store's root.
    fn commit(&self, batch: WriteBatch) -> Result<(), ApmError>;
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T, ApmError> {
    serde_json::from_slice(bytes).map_err(|e| {
        ApmError::storage(
            format!("cannot decode record {}", String::from_utf8_lossy(key)),
            e,
        )
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ApmError> {
    serde_json::to_vec(value).map_err(|e| ApmError::storage("cannot encode record", e))
}

/// JSON-encoded [`Storage`] backed by any [`Database`].
pub struct DbStorage<T> {
    db: Arc<dyn Database>,
    _record: PhantomData<fn() -> T>,
}

impl<T> DbStorage<T> {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }
}

impl<T> Clone for DbStorage<T> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<T: Serialize + DeserializeOwned> Storage<T> for DbStorage<T> {
    fn get(&self, key: &[u8]) -> Result<Option<T>, ApmError> {
        self.db
            .get(key)?
            .map(|bytes| decode(key, &bytes))
            .transpose()
    }

    fn put(&self, key: &[u8], value: &T) -> Result<(), ApmError> {
        self.db.put(key, &encode(value)?)
    }

    fn delete(&self, key: &[u8]) -> Result<(), ApmError> {
        self.db.delete(key)
    }

    fn has(&self, key: &[u8]) -> Result<bool, ApmError> {
        self.db.has(key)
    }

    fn iter(&self) -> Result<Iter<T>, ApmError> {
        Ok(Iter::new(self.db.iter_prefix(&[])?))
    }

    fn stage_put(&self, batch: &mut WriteBatch, key: &[u8], value: &T) -> Result<(), ApmError> {
        self.db.stage_put(batch, key, encode(value)?);
        Ok(())
    }

    fn stage_delete(&self, batch: &mut WriteBatch, key: &[u8]) {
        self.db.stage_delete(batch, key);
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), ApmError> {
        self.db.write(batch)
    }
}

/// Ordered cursor over a snapshot of a typed store.
pub struct Iter<T> {
    rows: std::vec::IntoIter<KvPair>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Iter<T> {
    fn new(rows: Vec<KvPair>) -> Self {
        Self {
            rows: rows.into_iter(),
            _record: PhantomData,
        }
    }
}

impl<T> Iterator for Iter<T> {
    type Item = Entry<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|(key, raw)| Entry {
            key,
            raw,
            _record: PhantomData,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// One record yielded by [`Iter`].
pub struct Entry<T> {
    key: Vec<u8>,
    raw: Vec<u8>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Entry<T> {
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The key as text. Registry keys are aliases and plugin names.
    pub fn key_str(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

impl<T: DeserializeOwned> Entry<T> {
    /// Decodes the record. Decode failures surface here, not during iteration.
    pub fn value(&self) -> Result<T, ApmError> {
        decode(&self.key, &self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDatabase;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        n: u32,
    }

    fn store() -> (Arc<dyn Database>, DbStorage<Record>) {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        (db.clone(), DbStorage::new(db))
    }

    #[test]
    fn get_missing_is_none() {
        let (_, s) = store();
        assert_eq!(s.get(b"nope").unwrap(), None);
        assert!(!s.has(b"nope").unwrap());
    }

    #[test]
    fn put_get_delete() {
        let (_, s) = store();
        s.put(b"a", &Record { n: 1 }).unwrap();
        assert_eq!(s.get(b"a").unwrap(), Some(Record { n: 1 }));
        s.delete(b"a").unwrap();
        assert_eq!(s.get(b"a").unwrap(), None);
    }

    #[test]
    fn iteration_defers_decode_errors_to_value() {
        let (db, s) = store();
        s.put(b"a", &Record { n: 1 }).unwrap();
        db.put(b"b", b"not json").unwrap();
        s.put(b"c", &Record { n: 3 }).unwrap();

        let entries: Vec<Entry<Record>> = s.iter().unwrap().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key_str(), "a");
        assert_eq!(entries[0].value().unwrap(), Record { n: 1 });
        assert!(matches!(entries[1].value(), Err(ApmError::Storage { .. })));
        assert_eq!(entries[2].value().unwrap(), Record { n: 3 });
    }

    #[test]
    fn get_surfaces_decode_errors() {
        let (db, s) = store();
        db.put(b"bad", b"{").unwrap();
        assert!(matches!(s.get(b"bad"), Err(ApmError::Storage { .. })));
    }

    #[test]
    fn fresh_iter_sees_new_records() {
        let (_, s) = store();
        s.put(b"a", &Record { n: 1 }).unwrap();
        let first = s.iter().unwrap();
        s.put(b"b", &Record { n: 2 }).unwrap();
        assert_eq!(first.count(), 1);
        assert_eq!(s.iter().unwrap().count(), 2);
    }

    #[test]
    fn staged_writes_apply_on_commit() {
        let (_, s) = store();
        s.put(b"old", &Record { n: 0 }).unwrap();
        let mut batch = WriteBatch::new();
        s.stage_put(&mut batch, b"new", &Record { n: 9 }).unwrap();
        s.stage_delete(&mut batch, b"old");
        assert!(s.get(b"new").unwrap().is_none());
        s.commit(batch).unwrap();
        assert_eq!(s.get(b"new").unwrap(), Some(Record { n: 9 }));
        assert!(!s.has(b"old").unwrap());
    }
}
