// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Credvault integration tests.
//!
//! Provides in-memory capability implementations and a harness for fast,
//! deterministic tests without a database or key-management service.
//!
//! # Components
//!
//! - [`MemoryStore`] - in-memory key-value store with fault injection
//! - [`MockKms`] - mock key management that enforces encryption context
//! - [`TestHarness`] - a driver wired to both

pub mod harness;
pub mod memory_store;
pub mod mock_kms;

pub use harness::{TEST_KEY_ID, TestHarness};
pub use memory_store::MemoryStore;
pub use mock_kms::MockKms;
