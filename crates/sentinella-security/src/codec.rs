// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Token codec — `{payload, nonce, expiresAt}` as JSON, then base64url
// without padding so the result drops straight into a QR code or URL.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sentinella_core::error::{Result, SentinellaError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The signed content of a capability token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenEnvelope<P> {
    pub payload: P,
    pub nonce: String,
    /// Unix time in milliseconds after which the token is rejected.
    pub expires_at: i64,
}

/// Encode an envelope into its transport string.
pub fn encode<P: Serialize>(envelope: &TokenEnvelope<P>) -> Result<String> {
    let json = serde_json::to_vec(envelope)
        .map_err(|e| SentinellaError::TokenEncoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a transport string back into an envelope with payload type `P`.
pub fn decode<P: DeserializeOwned>(token: &str) -> Result<TokenEnvelope<P>> {
    let json = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| SentinellaError::TokenEncoding(format!("base64 decode error: {e}")))?;
    serde_json::from_slice(&json)
        .map_err(|e| SentinellaError::TokenEncoding(format!("envelope decode error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transport_alphabet_is_url_safe() {
        let envelope = TokenEnvelope {
            payload: json!({"note": "???>>>~~~"}),
            nonce: "00ff".into(),
            expires_at: 1_700_000_000_000,
        };
        let token = encode(&envelope).unwrap();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(decode::<serde_json::Value>(&token).unwrap(), envelope);
    }

    #[test]
    fn wire_field_names() {
        let envelope = TokenEnvelope {
            payload: 7u32,
            nonce: "ab".into(),
            expires_at: 5,
        };
        let token = encode(&envelope).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(token).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value, json!({"payload": 7, "nonce": "ab", "expiresAt": 5}));
    }

    #[test]
    fn rejects_non_base64() {
        assert!(decode::<u32>("not base64!").is_err());
    }

    #[test]
    fn rejects_incomplete_envelope() {
        let token = URL_SAFE_NO_PAD.encode(br#"{"payload":1,"nonce":"aa"}"#);
        let err = decode::<u32>(&token).unwrap_err();
        assert!(matches!(err, SentinellaError::TokenEncoding(_)));
    }

    #[test]
    fn rejects_payload_of_wrong_shape() {
        let token = encode(&TokenEnvelope {
            payload: "text",
            nonce: "aa".into(),
            expires_at: 1,
        })
        .unwrap();
        assert!(decode::<u64>(&token).is_err());
    }
}
