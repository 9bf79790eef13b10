// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search hashes — SHA-256 over a normalised identifier, stored next to the
// ciphertext so equality lookups never need the key.

use sha2::{Digest, Sha256};

/// Hex length of a search hash (SHA-256, lowercase).
pub const SEARCH_HASH_LEN: usize = 64;

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Canonical form fed to the hash: surrounding whitespace trimmed, uppercased.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Deterministic search hash for a PII value.
///
/// `"rssmra85m01h501z"` and `" RSSMRA85M01H501Z "` hash identically, so
/// lookups work whatever formatting the upstream form used. The empty string
/// maps to the empty string.
pub fn search_hash(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    hash_bytes(normalize(value).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_known_value() {
        // SHA-256("hello") — verified against coreutils sha256sum.
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_bytes(b"hello"), expected);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            search_hash("rssmra85m01h501z"),
            search_hash("RSSMRA85M01H501Z")
        );
    }

    #[test]
    fn whitespace_insensitive() {
        assert_eq!(
            search_hash("  IT60X0542811101000000123456\t"),
            search_hash("it60x0542811101000000123456")
        );
    }

    #[test]
    fn fixed_length_lowercase_hex() {
        let hash = search_hash("12345678901");
        assert_eq!(hash.len(), SEARCH_HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_is_of_normalised_value() {
        assert_eq!(search_hash(" abc "), hash_bytes(b"ABC"));
    }

    #[test]
    fn empty_maps_to_empty() {
        assert_eq!(search_hash(""), "");
    }

    #[test]
    fn distinct_values_distinct_hashes() {
        assert_ne!(search_hash("RSSMRA85M01H501Z"), search_hash("VRDGPP80A01F205X"));
    }
}
