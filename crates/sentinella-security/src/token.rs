// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability tokens — HMAC-SHA256 signed, time-bounded authorisations for
// physical actions (a vendor checking in at a stall).
//
// The signature covers the exact bytes of the transport string, so any
// change to the embedded payload, nonce or expiry invalidates it. There is
// no single-use ledger: a captured pair stays valid until it expires.

use chrono::{DateTime, Utc};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use sentinella_core::error::{Result, SentinellaError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::codec::{self, TokenEnvelope};
use crate::key::KeySource;

/// Random bytes per nonce (hex-encoded to 32 characters).
pub const NONCE_LEN: usize = 16;

/// Hex length of a signature.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Separator between token and signature in the single-string QR form.
pub const QR_SEPARATOR: char = '.';

/// Everything the caller needs to hand a capability to a remote actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub signature: String,
    /// Unix time in milliseconds.
    pub expires_at: i64,
    pub nonce: String,
}

impl IssuedToken {
    /// `<token>.<signature>`, ready to embed in a single QR code.
    pub fn qr_payload(&self) -> String {
        format!("{}{QR_SEPARATOR}{}", self.token, self.signature)
    }
}

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Signature does not match the token bytes (forged or tampered).
    InvalidSignature,
    /// Signature matches but the token does not decode into the expected shape.
    Malformed,
    /// Past `expiresAt`.
    Expired,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidSignature => "invalid signature",
            Self::Malformed => "malformed token",
            Self::Expired => "token expired",
        };
        f.write_str(s)
    }
}

/// Result of validating a token/signature pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerdict<P> {
    Valid {
        payload: P,
        nonce: String,
        expires_at: i64,
    },
    Rejected(RejectReason),
}

impl<P> TokenVerdict<P> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            Self::Valid { payload, .. } => Some(payload),
            Self::Rejected(_) => None,
        }
    }

    pub fn into_payload(self) -> Option<P> {
        match self {
            Self::Valid { payload, .. } => Some(payload),
            Self::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Valid { .. } => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Issues and validates capability tokens with a key from [`KeySource`].
#[derive(Debug, Clone)]
pub struct TokenSigner {
    keys: KeySource,
    rng: SystemRandom,
}

impl TokenSigner {
    pub fn new(keys: KeySource) -> Self {
        Self {
            keys,
            rng: SystemRandom::new(),
        }
    }

    fn hmac_key(&self) -> hmac::Key {
        hmac::Key::new(hmac::HMAC_SHA256, &self.keys.derive_key()[..])
    }

    /// Lowercase hex HMAC-SHA256 of the token bytes.
    pub fn sign(&self, token: &str) -> String {
        hex::encode(hmac::sign(&self.hmac_key(), token.as_bytes()))
    }

    /// Issue a token for `payload` valid for `ttl_secs` from now.
    pub fn issue<P: Serialize>(&self, payload: &P, ttl_secs: u64) -> Result<IssuedToken> {
        self.issue_at(payload, ttl_secs, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    #[instrument(skip_all, fields(ttl_secs = ttl_secs))]
    pub fn issue_at<P: Serialize>(
        &self,
        payload: &P,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let mut raw = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut raw)
            .map_err(|e| SentinellaError::TokenEncoding(format!("nonce generation failed: {e}")))?;
        let nonce = hex::encode(raw);

        let ttl_ms = i64::try_from(ttl_secs)
            .ok()
            .and_then(|s| s.checked_mul(1000))
            .ok_or_else(|| SentinellaError::TokenEncoding(format!("ttl {ttl_secs}s out of range")))?;
        let expires_at = now.timestamp_millis().saturating_add(ttl_ms);

        let token = codec::encode(&TokenEnvelope {
            payload,
            nonce: nonce.clone(),
            expires_at,
        })?;
        let signature = self.sign(&token);

        debug!(token_len = token.len(), expires_at, "capability token issued");
        Ok(IssuedToken {
            token,
            signature,
            expires_at,
            nonce,
        })
    }

    /// Validate a token/signature pair against the current time.
    pub fn validate<P: DeserializeOwned>(&self, token: &str, signature: &str) -> TokenVerdict<P> {
        self.validate_at(token, signature, Utc::now())
    }

    /// Validate a token/signature pair as if the current time were `now`.
    ///
    /// Checks run in order: signature (constant time, over the raw token
    /// bytes), structure, expiry. A token is still valid at exactly
    /// `expires_at`.
    #[instrument(skip_all, fields(token_len = token.len()))]
    pub fn validate_at<P: DeserializeOwned>(
        &self,
        token: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> TokenVerdict<P> {
        if !self.signature_matches(token, signature) {
            info!(reason = %RejectReason::InvalidSignature, "capability token rejected");
            return TokenVerdict::Rejected(RejectReason::InvalidSignature);
        }

        let envelope: TokenEnvelope<P> = match codec::decode(token) {
            Ok(envelope) => envelope,
            Err(e) => {
                info!(reason = %RejectReason::Malformed, error = %e, "capability token rejected");
                return TokenVerdict::Rejected(RejectReason::Malformed);
            }
        };

        if now.timestamp_millis() > envelope.expires_at {
            info!(
                reason = %RejectReason::Expired,
                expires_at = envelope.expires_at,
                "capability token rejected"
            );
            return TokenVerdict::Rejected(RejectReason::Expired);
        }

        debug!("capability token accepted");
        TokenVerdict::Valid {
            payload: envelope.payload,
            nonce: envelope.nonce,
            expires_at: envelope.expires_at,
        }
    }

    /// Validate the single-string `<token>.<signature>` form.
    pub fn validate_qr<P: DeserializeOwned>(&self, qr: &str) -> TokenVerdict<P> {
        self.validate_qr_at(qr, Utc::now())
    }

    pub fn validate_qr_at<P: DeserializeOwned>(
        &self,
        qr: &str,
        now: DateTime<Utc>,
    ) -> TokenVerdict<P> {
        match qr.trim().rsplit_once(QR_SEPARATOR) {
            Some((token, signature)) => self.validate_at(token, signature, now),
            None => TokenVerdict::Rejected(RejectReason::Malformed),
        }
    }

    fn signature_matches(&self, token: &str, signature: &str) -> bool {
        // Only the canonical lowercase form is accepted; changing the case
        // of a hex digit must invalidate the signature like any other edit.
        let canonical = signature.len() == SIGNATURE_HEX_LEN
            && signature
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return false;
        }
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        hmac::verify(&self.hmac_key(), token.as_bytes(), &tag).is_ok()
    }
}
