// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase-protected local key management.
//!
//! [`LocalKms`] implements [`KeyManagement`](credvault_core::KeyManagement)
//! with AES-256-GCM wrapping keys stored in the credential database, so the
//! store works without any network key-management service.

pub mod aead;
pub mod kdf;
pub mod keyring;
pub mod prompt;

pub use kdf::KdfParams;
pub use keyring::{BLOB_FORMAT, KeyInfo, LocalKms, validate_key_id};
pub use prompt::{PASSPHRASE_ENV_VAR, read_new_passphrase, read_passphrase};
