// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Sentinella.
//
// Token rejection and position-lookup outages are deliberately absent here:
// both are ordinary outcomes at a security boundary and travel as values
// (`TokenVerdict`, `LookupOutcome`) rather than as errors.

use thiserror::Error;

/// Top-level error type for all Sentinella operations.
#[derive(Debug, Error)]
pub enum SentinellaError {
    // -- Configuration --
    /// Missing or weak secret. Fatal: never retried, never defaulted.
    #[error("configuration error: {0}")]
    Configuration(String),

    // -- Field encryption --
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    // -- Capability tokens --
    #[error("token encoding failed: {0}")]
    TokenEncoding(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),
}

impl SentinellaError {
    /// Whether the error is an operator problem (bad deployment) rather than
    /// a problem with the data being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SentinellaError>;
