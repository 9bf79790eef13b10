// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! sentinella-security — cryptographic half of the Sentinella trust layer.
//!
//! Field-level encryption of citizen identifiers (fiscal codes, VAT numbers,
//! IBANs) with a deterministic search hash beside each ciphertext, and
//! HMAC-signed, time-bounded capability tokens for QR check-ins. Every
//! operation is synchronous and stateless apart from the injected
//! [`KeySource`], so handles can be cloned freely across request threads.

pub mod audit;
pub mod codec;
pub mod integrity;
pub mod key;
pub mod token;
pub mod vault;

// PUBLIC API: Re-export core security primitives
pub use audit::{AuditEntry, AuditLog, SecurityAction};
pub use codec::TokenEnvelope;
pub use integrity::{hash_bytes, search_hash};
pub use key::KeySource;
pub use token::{IssuedToken, RejectReason, TokenSigner, TokenVerdict};
pub use vault::{PiiVault, ProtectedField, is_encrypted};
