// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key derivation — SHA-256 of the operator secret.
//
// The 32-byte key is recomputed on every call and handed out in a
// `Zeroizing` buffer; nothing here caches it, so rotating the secret only
// requires building a new `KeySource`.

use std::fmt;

use sentinella_core::error::{Result, SentinellaError};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Minimum accepted secret length, in characters.
pub const MIN_SECRET_LEN: usize = 32;

/// Derived key length in bytes (AES-256 / HMAC-SHA256).
pub const KEY_LEN: usize = 32;

/// Explicit key-derivation handle injected into the vault and the signer.
#[derive(Clone)]
pub struct KeySource {
    secret: Zeroizing<String>,
}

impl KeySource {
    /// Wrap an operator secret.
    ///
    /// Fails with `SentinellaError::Configuration` when the secret is empty or
    /// shorter than [`MIN_SECRET_LEN`] characters.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(SentinellaError::Configuration(
                "no secret configured".into(),
            ));
        }
        let len = secret.chars().count();
        if len < MIN_SECRET_LEN {
            return Err(SentinellaError::Configuration(format!(
                "secret must be at least {MIN_SECRET_LEN} characters, got {len}"
            )));
        }
        Ok(Self { secret })
    }

    /// Read the secret from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self> {
        let secret = std::env::var(var).map_err(|_| {
            SentinellaError::Configuration(format!("environment variable {var} is not set"))
        })?;
        Self::new(secret).map_err(|e| match e {
            SentinellaError::Configuration(detail) => {
                SentinellaError::Configuration(format!("{var}: {detail}"))
            }
            other => other,
        })
    }

    /// Derive the 32-byte symmetric key.
    pub fn derive_key(&self) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&Sha256::digest(self.secret.as_bytes()));
        key
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySource")
            .field("secret", &"<redacted>")
            .finish()
    }
}
