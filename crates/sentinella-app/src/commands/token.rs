// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `issue` and `validate` commands for stall check-in tokens.

use std::path::Path;

use anyhow::{Context, Result};
use sentinella_core::TrustConfig;
use sentinella_core::types::CapabilityPayload;
use sentinella_security::{
    AuditLog, IssuedToken, SecurityAction, TokenSigner, TokenVerdict, hash_bytes,
};
use serde_json::json;

use super::{key_source, open_audit, print_json};

pub fn issue(
    config: &TrustConfig,
    vendor_id: u64,
    stall_id: u64,
    market_id: u64,
    ttl: Option<u64>,
    audit: Option<&Path>,
) -> Result<()> {
    let signer = TokenSigner::new(key_source(config)?);
    let log = open_audit(audit)?;
    let payload = CapabilityPayload::StallCheckIn {
        vendor_id,
        stall_id,
        market_id,
    };
    let issued = issue_token(
        &signer,
        &payload,
        ttl.unwrap_or(config.token_ttl_secs),
        log.as_ref(),
    )?;
    print_json(&json!({
        "qr": issued.qr_payload(),
        "token": issued.token,
        "signature": issued.signature,
        "nonce": issued.nonce,
        "expiresAt": issued.expires_at,
    }))
}

/// Issue a token, auditing it under its nonce.
fn issue_token(
    signer: &TokenSigner,
    payload: &CapabilityPayload,
    ttl_secs: u64,
    log: Option<&AuditLog>,
) -> Result<IssuedToken> {
    let issued = signer
        .issue(payload, ttl_secs)
        .context("issuing check-in token")?;
    if let Some(log) = log {
        log.record(
            SecurityAction::TokenIssued,
            &issued.nonce,
            true,
            Some(&format!("expiresAt={}", issued.expires_at)),
        )?;
    }
    Ok(issued)
}

pub fn validate(config: &TrustConfig, qr: &str, audit: Option<&Path>) -> Result<()> {
    let signer = TokenSigner::new(key_source(config)?);
    let log = open_audit(audit)?;
    let verdict = signer.validate_qr::<CapabilityPayload>(qr);

    if let (Some(log), TokenVerdict::Rejected(reason)) = (&log, &verdict) {
        // The token is untrusted; audit under its hash rather than its contents.
        let subject = hash_bytes(qr.as_bytes());
        log.record(
            SecurityAction::TokenRejected,
            &subject,
            false,
            Some(&reason.to_string()),
        )?;
    }

    match verdict {
        TokenVerdict::Valid {
            payload,
            nonce,
            expires_at,
        } => print_json(&json!({
            "valid": true,
            "payload": payload,
            "nonce": nonce,
            "expiresAt": expires_at,
        })),
        TokenVerdict::Rejected(reason) => print_json(&json!({
            "valid": false,
            "reason": reason,
        })),
    }
}
