// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope encryption engine for the Credvault credential store.
//!
//! Each secret gets its own 64 bytes of key material from the key-management
//! capability: half keys AES-256-CTR over the payload, half keys an
//! HMAC-SHA256 over the ciphertext. The [`codec`] module turns the binary
//! results into the text attributes the store persists.

pub mod cipher;
pub mod codec;
pub mod envelope;

pub use envelope::{Envelope, EnvelopeKeys, Sealed, generate_envelope, unwrap_envelope};
