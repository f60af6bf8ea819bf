// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits for the two external services the driver consumes.
//!
//! Both use `#[async_trait]` so implementations can be held as trait objects
//! and passed explicitly into the driver.

pub mod kms;
pub mod store;

pub use kms::KeyManagement;
pub use store::KeyValueStore;
