// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `distance` and `checkin` commands.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sentinella_core::TrustConfig;
use sentinella_core::types::{GeoPoint, PositionReport};
use sentinella_geo::{PlausibilityScorer, PlausibilityVerdict, SqlitePositionStore, haversine_m};
use sentinella_security::{AuditLog, SecurityAction};
use serde_json::json;

use super::{open_audit, print_json};

pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<()> {
    print_json(&json!({ "meters": haversine_m(lat1, lon1, lat2, lon2) }))
}

pub fn checkin(
    config: &TrustConfig,
    db: &Path,
    entity_id: &str,
    lat: f64,
    lon: f64,
    at: Option<&str>,
    audit: Option<&Path>,
) -> Result<()> {
    let observed_at = match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --at timestamp {raw:?}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let report = PositionReport::new(entity_id, GeoPoint::new(lat, lon), observed_at);

    let store = SqlitePositionStore::open(db).context("opening position store")?;
    let log = open_audit(audit)?;
    let verdict = score_checkin(
        &PlausibilityScorer::new(config),
        &store,
        &report,
        log.as_ref(),
    )?;
    print_json(&verdict)
}

/// Score and store the report; flagged reports go to the review queue
/// instead of the position history.
fn score_checkin(
    scorer: &PlausibilityScorer,
    store: &SqlitePositionStore,
    report: &PositionReport,
    log: Option<&AuditLog>,
) -> Result<PlausibilityVerdict> {
    let verdict = store.check_in(scorer, report)?;
    if let (Some(log), true) = (log, verdict.needs_review()) {
        log.record(
            SecurityAction::CheckinFlagged,
            &report.entity_id,
            false,
            Some(&serde_json::to_string(&verdict)?),
        )?;
    }
    Ok(verdict)
}
