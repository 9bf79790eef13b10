// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite-backed last-known-position store.
//
// Schema:
//   position_reports(
//     entity_id       TEXT    NOT NULL,
//     lat             REAL    NOT NULL,
//     lon             REAL    NOT NULL,
//     observed_at_ms  INTEGER NOT NULL   -- Unix milliseconds
//   )

use std::path::Path;

use chrono::DateTime;
use rusqlite::{Connection, OptionalExtension, params};
use sentinella_core::error::{Result, SentinellaError};
use sentinella_core::types::{GeoPoint, PositionReport};
use tracing::{debug, instrument};

use crate::plausibility::{LookupOutcome, PlausibilityScorer, PlausibilityVerdict, PositionLookup};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS position_reports (
    entity_id       TEXT    NOT NULL,
    lat             REAL    NOT NULL,
    lon             REAL    NOT NULL,
    observed_at_ms  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS position_reports_entity
    ON position_reports(entity_id, observed_at_ms);";

fn db_err(e: rusqlite::Error) -> SentinellaError {
    SentinellaError::Database(e.to_string())
}

/// Append-only history of position reports with a latest-per-entity query.
pub struct SqlitePositionStore {
    conn: Connection,
}

impl SqlitePositionStore {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        debug!("position store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Store one report. Call after scoring, so the report being checked is
    /// never compared with itself.
    pub fn record(&self, report: &PositionReport) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO position_reports (entity_id, lat, lon, observed_at_ms)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    report.entity_id,
                    report.point.lat,
                    report.point.lon,
                    report.observed_at.timestamp_millis()
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    /// Score `report` against the stored history, then keep it only if it
    /// was plausible. A flagged report never becomes the last known position,
    /// so one spoofed fix does not get the next genuine one flagged as well.
    #[instrument(skip_all, fields(entity_id = %report.entity_id))]
    pub fn check_in(
        &self,
        scorer: &PlausibilityScorer,
        report: &PositionReport,
    ) -> Result<PlausibilityVerdict> {
        let verdict = scorer.check(report, self);
        if verdict.plausible {
            self.record(report)?;
        } else {
            debug!(reason = ?verdict.reason, "flagged report not stored");
        }
        Ok(verdict)
    }

    /// Most recent report for `entity_id`, if any.
    pub fn latest(&self, entity_id: &str) -> Result<Option<PositionReport>> {
        let row = self
            .conn
            .query_row(
                "SELECT lat, lon, observed_at_ms
                 FROM position_reports
                 WHERE entity_id = ?1
                 ORDER BY observed_at_ms DESC
                 LIMIT 1",
                params![entity_id],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;

        let Some((lat, lon, observed_at_ms)) = row else {
            return Ok(None);
        };
        let observed_at = DateTime::from_timestamp_millis(observed_at_ms).ok_or_else(|| {
            SentinellaError::Database(format!("timestamp {observed_at_ms} out of range"))
        })?;
        Ok(Some(PositionReport::new(
            entity_id,
            GeoPoint::new(lat, lon),
            observed_at,
        )))
    }
}

impl PositionLookup for SqlitePositionStore {
    fn last_position(&self, entity_id: &str) -> LookupOutcome {
        match self.latest(entity_id) {
            Ok(Some(report)) => LookupOutcome::Found(report),
            Ok(None) => LookupOutcome::NoPrior,
            Err(e) => LookupOutcome::Unavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn report(entity: &str, lat: f64, minutes: i64) -> PositionReport {
        let t0 = Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0).unwrap();
        PositionReport::new(entity, GeoPoint::new(lat, 11.34), t0 + Duration::minutes(minutes))
    }

    #[test]
    fn empty_store_has_no_prior() {
        let store = SqlitePositionStore::open_in_memory().unwrap();
        assert_eq!(store.last_position("vendor-1"), LookupOutcome::NoPrior);
    }

    #[test]
    fn latest_by_observation_time_not_insert_order() {
        let store = SqlitePositionStore::open_in_memory().unwrap();
        store.record(&report("vendor-1", 44.50, 10)).unwrap();
        store.record(&report("vendor-1", 44.49, 0)).unwrap();
        store.record(&report("vendor-2", 41.90, 30)).unwrap();

        let latest = store.latest("vendor-1").unwrap().unwrap();
        assert_eq!(latest, report("vendor-1", 44.50, 10));
    }

    #[test]
    fn flagged_report_is_not_stored() {
        let store = SqlitePositionStore::open_in_memory().unwrap();
        let scorer = PlausibilityScorer::default();

        assert!(store.check_in(&scorer, &report("vendor-1", 44.49, 0)).unwrap().plausible);
        // Roughly 280 km north of the first fix five minutes later.
        let spoofed = report("vendor-1", 47.0, 5);
        assert!(!store.check_in(&scorer, &spoofed).unwrap().plausible);

        assert_eq!(store.latest("vendor-1").unwrap().unwrap(), report("vendor-1", 44.49, 0));
    }

    #[test]
    fn broken_table_is_unavailable() {
        let store = SqlitePositionStore::open_in_memory().unwrap();
        store.conn.execute_batch("DROP TABLE position_reports;").unwrap();
        assert!(matches!(
            store.last_position("vendor-1"),
            LookupOutcome::Unavailable(_)
        ));
    }
}
