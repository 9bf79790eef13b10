// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `encrypt`, `decrypt` and `hash` commands.

use std::path::Path;

use anyhow::{Context, Result};
use sentinella_core::{SentinellaError, TrustConfig};
use sentinella_security::{
    AuditLog, PiiVault, ProtectedField, SecurityAction, hash_bytes, search_hash,
};
use serde_json::json;

use super::{key_source, open_audit, print_json};

pub fn encrypt(
    config: &TrustConfig,
    value: &str,
    with_hash: bool,
    audit: Option<&Path>,
) -> Result<()> {
    let vault = PiiVault::new(key_source(config)?);
    let log = open_audit(audit)?;
    let protected = seal(&vault, value, log.as_ref())?;
    if with_hash {
        print_json(&protected)
    } else {
        println!("{}", protected.ciphertext);
        Ok(())
    }
}

/// Encrypt and hash `value`, auditing under the search hash.
fn seal(vault: &PiiVault, value: &str, log: Option<&AuditLog>) -> Result<ProtectedField> {
    let protected = vault.protect(value)?;
    if let Some(log) = log {
        log.record(SecurityAction::PiiEncrypt, &protected.search_hash, true, None)?;
    }
    Ok(protected)
}

pub fn decrypt(
    config: &TrustConfig,
    value: &str,
    mask: Option<usize>,
    audit: Option<&Path>,
) -> Result<()> {
    let vault = PiiVault::new(key_source(config)?);
    let log = open_audit(audit)?;
    let plaintext = open_field(&vault, value, mask, log.as_ref())
        .context("value could not be decrypted with the configured secret")?;
    print_json(&json!({
        "plaintext": plaintext,
        "was_encrypted": vault.is_encrypted(value),
    }))
}

/// Decrypt (or mask) `value`. Decryption failures are audited under the
/// hash of the stored value, never the plaintext.
fn open_field(
    vault: &PiiVault,
    value: &str,
    mask: Option<usize>,
    log: Option<&AuditLog>,
) -> Result<String> {
    let result = match mask {
        Some(visible) => vault.reveal_masked(value, visible),
        None => vault.decrypt(value),
    };
    if let (Some(log), Err(SentinellaError::Decryption(detail))) = (log, &result) {
        log.record(
            SecurityAction::PiiDecryptFailed,
            &hash_bytes(value.as_bytes()),
            false,
            Some(detail),
        )?;
    }
    Ok(result?)
}

pub fn hash(value: &str) -> Result<()> {
    println!("{}", search_hash(value));
    Ok(())
}
