// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Credvault credential store.
//!
//! [`Database`] owns connection setup and migrations; [`SqliteStore`]
//! implements [`KeyValueStore`](credvault_core::KeyValueStore) on top of it.
//! The same database also holds the local key ring tables.

pub mod database;
pub mod migrations;
pub mod store;

pub use database::{Database, map_tr_err};
pub use store::SqliteStore;
