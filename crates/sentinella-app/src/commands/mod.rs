// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

pub mod geo;
pub mod review;
pub mod token;
pub mod vault;

use std::path::Path;

use anyhow::{Context, Result};
use sentinella_core::TrustConfig;
use sentinella_security::{AuditLog, KeySource};
use serde::Serialize;

/// Key source from the configured environment variable.
pub fn key_source(config: &TrustConfig) -> Result<KeySource> {
    KeySource::from_env(&config.secret_env_var)
        .with_context(|| format!("set {} to a secret of 32+ characters", config.secret_env_var))
}

/// Open the audit log when `--audit` was given.
pub fn open_audit(path: Option<&Path>) -> Result<Option<AuditLog>> {
    path.map(|p| {
        AuditLog::open(p).with_context(|| format!("opening audit log {}", p.display()))
    })
    .transpose()
}

/// Pretty-print a JSON document to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
