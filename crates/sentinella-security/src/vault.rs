// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PII vault — AES-256-GCM field encryption for fiscal codes, VAT numbers
// and IBANs stored in relational columns.
//
// Wire format (one column value):
//
//   <iv_hex>:<tag_hex>:<ciphertext_hex>
//    24 chars  32 chars  2 * plaintext bytes
//
// Anything that does not have that shape is legacy plaintext: the columns
// were retrofitted onto existing rows, so `decrypt` hands such values back
// untouched instead of failing.

use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use sentinella_core::error::{Result, SentinellaError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::integrity::search_hash;
use crate::key::KeySource;

/// IV length in bytes (96-bit GCM nonce).
pub const IV_LEN: usize = NONCE_LEN;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

const SEPARATOR: char = ':';

/// Ciphertext plus its sibling search-hash column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedField {
    pub ciphertext: String,
    pub search_hash: String,
}

/// Field-level encryption over opaque string values.
///
/// Stateless apart from the injected [`KeySource`]; safe to share across
/// threads and call concurrently.
#[derive(Debug, Clone)]
pub struct PiiVault {
    keys: KeySource,
    rng: SystemRandom,
}

impl PiiVault {
    pub fn new(keys: KeySource) -> Self {
        Self {
            keys,
            rng: SystemRandom::new(),
        }
    }

    fn cipher(&self) -> Result<LessSafeKey> {
        let key = self.keys.derive_key();
        let unbound = UnboundKey::new(&AES_256_GCM, &key[..])
            .map_err(|e| SentinellaError::Encryption(format!("key setup failed: {e}")))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt `plaintext` into the three-segment wire format.
    ///
    /// The empty string is returned unchanged. Every call draws a fresh
    /// random IV, so encrypting the same value twice never yields the same
    /// output.
    #[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut iv = [0u8; IV_LEN];
        self.rng
            .fill(&mut iv)
            .map_err(|e| SentinellaError::Encryption(format!("IV generation failed: {e}")))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher()?
            .seal_in_place_separate_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
            .map_err(|e| SentinellaError::Encryption(e.to_string()))?;

        let encoded = format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(iv),
            hex::encode(tag),
            hex::encode(&in_out)
        );
        debug!(encoded_len = encoded.len(), "field encrypted");
        Ok(encoded)
    }

    /// Decrypt a value produced by [`PiiVault::encrypt`].
    ///
    /// Empty input gives empty output and values that are not shaped like
    /// ciphertext are returned as-is. A value that *is* shaped like
    /// ciphertext but fails authentication, carries bad hex, or decrypts to
    /// invalid UTF-8 is a `SentinellaError::Decryption`.
    #[instrument(skip_all, fields(value_len = value.len()))]
    pub fn decrypt(&self, value: &str) -> Result<String> {
        if value.is_empty() {
            return Ok(String::new());
        }
        let Some((iv_hex, tag_hex, ct_hex)) = split_segments(value) else {
            info!("legacy plaintext value passed through");
            return Ok(value.to_owned());
        };

        let iv = hex::decode(iv_hex)
            .map_err(|e| SentinellaError::Decryption(format!("malformed IV: {e}")))?;
        let tag = hex::decode(tag_hex)
            .map_err(|e| SentinellaError::Decryption(format!("malformed tag: {e}")))?;
        let mut in_out = hex::decode(ct_hex)
            .map_err(|e| SentinellaError::Decryption(format!("malformed ciphertext: {e}")))?;
        in_out.extend_from_slice(&tag);

        let nonce = Nonce::try_assume_unique_for_key(&iv)
            .map_err(|_| SentinellaError::Decryption("IV must be 12 bytes".into()))?;
        let plaintext = self
            .cipher()
            .map_err(|e| SentinellaError::Decryption(e.to_string()))?
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| {
                SentinellaError::Decryption("authentication failed (wrong key or tampered value)".into())
            })?;

        let plaintext = String::from_utf8(plaintext.to_vec())
            .map_err(|e| SentinellaError::Decryption(format!("plaintext is not UTF-8: {e}")))?;
        debug!(plaintext_len = plaintext.len(), "field decrypted");
        Ok(plaintext)
    }

    /// Search hash of `value`; see [`crate::integrity::search_hash`].
    pub fn hash(&self, value: &str) -> String {
        search_hash(value)
    }

    /// Structural check; see [`is_encrypted`].
    pub fn is_encrypted(&self, value: &str) -> bool {
        is_encrypted(value)
    }

    /// Encrypt for a nullable column.
    pub fn encrypt_optional(&self, plaintext: Option<&str>) -> Result<Option<String>> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    /// Decrypt a nullable column.
    pub fn decrypt_optional(&self, value: Option<&str>) -> Result<Option<String>> {
        value.map(|v| self.decrypt(v)).transpose()
    }

    /// Ciphertext and search hash for a value about to be stored.
    pub fn protect(&self, plaintext: &str) -> Result<ProtectedField> {
        Ok(ProtectedField {
            ciphertext: self.encrypt(plaintext)?,
            search_hash: search_hash(plaintext),
        })
    }

    /// Decrypt and mask all but the last `visible` characters with `*`.
    pub fn reveal_masked(&self, value: &str, visible: usize) -> Result<String> {
        Ok(mask(&self.decrypt(value)?, visible))
    }
}

/// Whether `value` has the ciphertext shape: three segments, a 24-char hex
/// IV and a 32-char hex tag. Never touches the key.
pub fn is_encrypted(value: &str) -> bool {
    split_segments(value).is_some()
}

fn split_segments(value: &str) -> Option<(&str, &str, &str)> {
    let mut parts = value.split(SEPARATOR);
    let (iv, tag, ct) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let hex_of_len = |s: &str, bytes: usize| {
        s.len() == bytes * 2 && s.bytes().all(|b| b.is_ascii_hexdigit())
    };
    if !hex_of_len(iv, IV_LEN) || !hex_of_len(tag, TAG_LEN) || ct.is_empty() {
        return None;
    }
    Some((iv, tag, ct))
}

fn mask(value: &str, visible: usize) -> String {
    let total = value.chars().count();
    let hidden = total.saturating_sub(visible);
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}
