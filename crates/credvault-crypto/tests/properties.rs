// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for the envelope cipher and MAC.

use credvault_core::CredvaultError;
use credvault_crypto::EnvelopeKeys;
use credvault_crypto::envelope::ENVELOPE_KEY_BYTES;
use proptest::prelude::*;

fn keys_from(material: &[u8]) -> EnvelopeKeys {
    EnvelopeKeys::from_material(material).expect("64 bytes of material")
}

proptest! {
    #[test]
    fn seal_then_open_returns_plaintext(
        material in prop::collection::vec(any::<u8>(), ENVELOPE_KEY_BYTES),
        plaintext in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let keys = keys_from(&material);
        let sealed = keys.seal(&plaintext).unwrap();
        let opened = keys.open("p", &sealed.ciphertext, &sealed.mac).unwrap();
        prop_assert_eq!(opened.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn any_flipped_ciphertext_bit_is_detected(
        material in prop::collection::vec(any::<u8>(), ENVELOPE_KEY_BYTES),
        plaintext in prop::collection::vec(any::<u8>(), 1..256),
        bit in any::<prop::sample::Index>(),
    ) {
        let keys = keys_from(&material);
        let mut sealed = keys.seal(&plaintext).unwrap();
        let i = bit.index(sealed.ciphertext.len() * 8);
        sealed.ciphertext[i / 8] ^= 1 << (i % 8);
        let result = keys.open("p", &sealed.ciphertext, &sealed.mac);
        let is_integrity_failure = matches!(result, Err(CredvaultError::IntegrityCheckFailed { .. }));
        prop_assert!(is_integrity_failure);
    }

    #[test]
    fn any_flipped_mac_bit_is_detected(
        material in prop::collection::vec(any::<u8>(), ENVELOPE_KEY_BYTES),
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        bit in any::<prop::sample::Index>(),
    ) {
        let keys = keys_from(&material);
        let mut sealed = keys.seal(&plaintext).unwrap();
        let i = bit.index(sealed.mac.len() * 8);
        sealed.mac[i / 8] ^= 1 << (i % 8);
        let result = keys.open("p", &sealed.ciphertext, &sealed.mac);
        let is_integrity_failure = matches!(result, Err(CredvaultError::IntegrityCheckFailed { .. }));
        prop_assert!(is_integrity_failure);
    }
}
