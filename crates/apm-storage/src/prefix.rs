// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-space isolation by hashed namespace prefix.

use std::sync::Arc;

use apm_core::ApmError;
use sha2::{Digest, Sha256};

use crate::database::{Database, KvPair, WriteBatch};

/// A view of `inner` where every key is prefixed with `sha256(namespace)`.
///
/// The prefix has a fixed width, so two distinct namespaces can never
/// produce overlapping key ranges. Views nest: a `PrefixDatabase` over a
/// `PrefixDatabase` prepends both prefixes.
pub struct PrefixDatabase {
    inner: Arc<dyn Database>,
    prefix: [u8; 32],
}

impl PrefixDatabase {
    pub fn new(inner: Arc<dyn Database>, namespace: &str) -> Self {
        let mut prefix = [0u8; 32];
        prefix.copy_from_slice(&Sha256::digest(namespace.as_bytes()));
        Self { inner, prefix }
    }

    fn key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }
}

impl Database for PrefixDatabase {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ApmError> {
        self.inner.get(&self.key(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), ApmError> {
        self.inner.put(&self.key(key), value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), ApmError> {
        self.inner.delete(&self.key(key))
    }

    fn has(&self, key: &[u8]) -> Result<bool, ApmError> {
        self.inner.has(&self.key(key))
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<KvPair>, ApmError> {
        let strip = self.prefix.len();
        Ok(self
            .inner
            .iter_prefix(&self.key(prefix))?
            .into_iter()
            .map(|(mut k, v)| {
                k.drain(..strip);
                (k, v)
            })
            .collect())
    }

    fn write(&self, batch: WriteBatch) -> Result<(), ApmError> {
        self.inner.write(batch)
    }

    fn stage_put(&self, batch: &mut WriteBatch, key: &[u8], value: Vec<u8>) {
        self.inner.stage_put(batch, &self.key(key), value);
    }

    fn stage_delete(&self, batch: &mut WriteBatch, key: &[u8]) {
        self.inner.stage_delete(batch, &self.key(key));
    }
}
