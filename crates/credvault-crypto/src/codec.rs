// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Textual encodings for binary item attributes and version labels.
//!
//! Wrapped keys and ciphertext are stored as standard base64, the MAC as hex.
//! Version labels are zero-padded to [`VERSION_WIDTH`] digits so the store's
//! lexicographic ordering agrees with numeric ordering.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use credvault_core::{CredvaultError, MacAttribute};

/// Number of digits in a persisted version label.
pub const VERSION_WIDTH: usize = 19;

/// Largest version that fits in [`VERSION_WIDTH`] digits.
pub const MAX_VERSION: u64 = 9_999_999_999_999_999_999;

/// Encode bytes as standard base64.
pub fn b64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64.
pub fn b64_decode(text: &str) -> Result<Vec<u8>, CredvaultError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| CredvaultError::Codec(format!("invalid base64: {e}")))
}

/// Encode bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex (either case).
pub fn hex_decode(text: &str) -> Result<Vec<u8>, CredvaultError> {
    hex::decode(text.trim()).map_err(|e| CredvaultError::Codec(format!("invalid hex: {e}")))
}

/// Decode the MAC attribute in whichever shape it was stored.
///
/// A binary attribute still holds hex digits, not the raw tag.
pub fn decode_mac(attr: &MacAttribute) -> Result<Vec<u8>, CredvaultError> {
    match attr {
        MacAttribute::Text(text) => hex_decode(text),
        MacAttribute::Binary(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|_| {
                CredvaultError::Codec("binary MAC attribute is not hex text".to_string())
            })?;
            hex_decode(text)
        }
    }
}

/// Parse a version label as a non-negative decimal integer.
///
/// Leading zeros are accepted. Anything else (empty, sign, whitespace inside,
/// more than [`MAX_VERSION`]) is an error; invalid text never becomes zero.
pub fn parse_version(text: &str) -> Result<u64, CredvaultError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CredvaultError::InvalidVersion(text.to_string()));
    }
    match trimmed.parse::<u64>() {
        Ok(v) if v <= MAX_VERSION => Ok(v),
        _ => Err(CredvaultError::InvalidVersion(text.to_string())),
    }
}

/// Format a version number as a persisted label.
pub fn format_version(version: u64) -> String {
    format!("{version:0width$}", width = VERSION_WIDTH)
}

/// Human-readable form of a stored label: the plain number, or the label
/// itself if it is not numeric.
pub fn display_version(label: &str) -> String {
    parse_version(label)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| label.to_string())
}
