// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry persistence for apm.
//!
//! Provides an ordered byte-keyed [`Database`] with SQLite and in-memory
//! backends, hashed namespace prefixes, JSON-encoded typed stores, and the
//! [`Namespaces`] factory that lays out the registry key space.

pub mod database;
pub mod migrations;
pub mod namespace;
pub mod prefix;
pub mod typed;

pub use database::{BatchOp, Database, MemoryDatabase, SqliteDatabase, WriteBatch};
pub use namespace::{Namespaces, Repository};
pub use prefix::PrefixDatabase;
pub use typed::{DbStorage, Entry, Iter, Storage};
