// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned, envelope-encrypted secret storage.
//!
//! [`Driver`] implements put/get/delete/list over any
//! [`KeyValueStore`](credvault_core::KeyValueStore) and
//! [`KeyManagement`](credvault_core::KeyManagement) pair. The [`multi`]
//! module adds wildcard lookups on top of single gets.

pub mod driver;
pub mod multi;

pub use driver::{DEFAULT_MAX_CONCURRENT_GETS, DEFAULT_VERSION, Driver};
pub use multi::{Lookup, MultiRetrieval, RetrievalFailure, glob_match, is_pattern};
