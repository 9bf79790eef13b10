// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end behaviour of the vault and token signer through the public API.

use sentinella_core::SentinellaError;
use sentinella_core::types::CapabilityPayload;
use sentinella_security::{
    AuditLog, KeySource, PiiVault, RejectReason, SecurityAction, TokenSigner, is_encrypted,
    search_hash,
};

const SECRET: &str = "integration-secret-0123456789-abcdef";

fn keys() -> KeySource {
    KeySource::new(SECRET).expect("valid secret")
}

#[test]
fn decrypt_inverts_encrypt_for_assorted_identifiers() {
    let vault = PiiVault::new(keys());
    for value in [
        "RSSMRA85M01H501Z",
        "12345678901",
        "IT60X0542811101000000123456",
        "Maria Rossi",
        "x",
        "  padded  ",
        "a:b:c",
    ] {
        let encrypted = vault.encrypt(value).unwrap();
        assert!(is_encrypted(&encrypted), "{value}");
        assert_eq!(vault.decrypt(&encrypted).unwrap(), value);
    }
}

#[test]
fn vault_and_signer_share_one_key_source() {
    let keys = keys();
    let vault = PiiVault::new(keys.clone());
    let signer = TokenSigner::new(keys);

    let field = vault.protect("rssmra85m01h501z").unwrap();
    let issued = signer.issue(&CapabilityPayload::VendorBadge { vendor_id: 5 }, 60).unwrap();

    assert_eq!(vault.decrypt(&field.ciphertext).unwrap(), "rssmra85m01h501z");
    assert!(signer.validate::<CapabilityPayload>(&issued.token, &issued.signature).is_valid());
}

#[test]
fn equality_search_via_hash_column() {
    let vault = PiiVault::new(keys());
    // Rows as a caller would store them: (ciphertext, search_hash).
    let rows: Vec<_> = ["RSSMRA85M01H501Z", "VRDGPP80A01F205X", "BNCLRA90C41A944P"]
        .into_iter()
        .map(|v| vault.protect(v).unwrap())
        .collect();

    let needle = search_hash(" vrdgpp80a01f205x ");
    let hits: Vec<_> = rows.iter().filter(|r| r.search_hash == needle).collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(vault.decrypt(&hits[0].ciphertext).unwrap(), "VRDGPP80A01F205X");
}

#[test]
fn decryption_errors_propagate() {
    let vault = PiiVault::new(keys());
    let encrypted = vault.encrypt("RSSMRA85M01H501Z").unwrap();
    let rotated = PiiVault::new(KeySource::new("rotated-secret-0123456789-abcdefgh").unwrap());
    match rotated.decrypt(&encrypted) {
        Err(SentinellaError::Decryption(_)) => {}
        other => panic!("expected decryption error, got {other:?}"),
    }
}

#[test]
fn forged_check_in_is_rejected_and_audited() {
    let signer = TokenSigner::new(keys());
    let audit = AuditLog::open_in_memory().unwrap();

    let issued = signer
        .issue(
            &CapabilityPayload::StallCheckIn {
                vendor_id: 42,
                stall_id: 7,
                market_id: 1,
            },
            300,
        )
        .unwrap();

    // A different vendor's token presented with vendor 42's signature.
    let other = signer
        .issue(
            &CapabilityPayload::StallCheckIn {
                vendor_id: 43,
                stall_id: 7,
                market_id: 1,
            },
            300,
        )
        .unwrap();

    let verdict = signer.validate::<CapabilityPayload>(&other.token, &issued.signature);
    let reason = verdict.reason().expect("forgery must be rejected");
    assert_eq!(reason, RejectReason::InvalidSignature);
    audit
        .record(SecurityAction::TokenRejected, &other.nonce, false, Some(&reason.to_string()))
        .unwrap();

    let entries = audit.entries_for_subject(&other.nonce).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].details.as_deref(), Some("invalid signature"));
}

#[test]
fn expired_token_is_rejected() {
    let signer = TokenSigner::new(keys());
    let issued = signer.issue(&CapabilityPayload::VendorBadge { vendor_id: 1 }, 0).unwrap();
    let later = chrono::Utc::now() + chrono::Duration::seconds(5);
    let verdict = signer.validate_at::<CapabilityPayload>(&issued.token, &issued.signature, later);
    assert_eq!(verdict.reason(), Some(RejectReason::Expired));
}
