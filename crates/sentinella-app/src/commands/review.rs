// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `review` command: the manual-review queue of flagged check-ins.

use std::path::Path;

use anyhow::{Context, Result};
use sentinella_security::AuditLog;

use super::print_json;

pub fn list(audit: &Path, limit: u32) -> Result<()> {
    let log = AuditLog::open(audit)
        .with_context(|| format!("opening audit log {}", audit.display()))?;
    let queue = log.flagged_checkins(limit)?;
    tracing::info!(pending = queue.len(), "review queue loaded");
    print_json(&queue)
}
