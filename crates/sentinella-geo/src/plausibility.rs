// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// GPS plausibility scoring for check-ins.
//
// Compares a new position report with the entity's last known position and
// flags movement faster than the configured speed bound. The verdict is an
// advisory fraud signal for manual review; nothing here blocks a check-in.
// A missing or unreachable last position is always plausible (fail-open).

use chrono::{DateTime, Utc};
use sentinella_core::config::TrustConfig;
use sentinella_core::types::{GeoPoint, PositionReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::distance::distance_m;

/// Answer of a [`PositionLookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The entity's most recent known position.
    Found(PositionReport),
    /// The entity has never reported a position.
    NoPrior,
    /// The backing store could not answer (outage, timeout, ...).
    Unavailable(String),
}

/// Caller-supplied capability that retrieves an entity's last known position.
///
/// Implementations own all I/O concerns (caching, retries, timeouts); the
/// scorer only interprets the outcome.
pub trait PositionLookup {
    fn last_position(&self, entity_id: &str) -> LookupOutcome;
}

impl<F> PositionLookup for F
where
    F: Fn(&str) -> LookupOutcome,
{
    fn last_position(&self, entity_id: &str) -> LookupOutcome {
        self(entity_id)
    }
}

/// Why a report was judged the way it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlausibilityReason {
    /// First report for this entity.
    NoPriorPosition,
    /// Lookup failed or returned unusable data; fail-open.
    LookupUnavailable,
    /// Displacement within GPS jitter.
    WithinGpsTolerance,
    /// Implied speed at or below the bound.
    WithinSpeedLimit,
    /// Implied speed above the bound.
    ExceedsSpeedLimit,
    /// Moved beyond GPS jitter with no time elapsed (or time running backwards).
    NoElapsedTime,
    /// Reported coordinates are not a valid position.
    InvalidCoordinates,
}

/// Outcome of one plausibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityVerdict {
    pub plausible: bool,
    pub reason: PlausibilityReason,
    /// Metres from the previous position, when one was available.
    pub distance_m: Option<f64>,
    /// Seconds since the previous observation, when one was available.
    pub elapsed_secs: Option<f64>,
    /// Average speed implied by the two reports, when time has elapsed.
    pub implied_speed_kmh: Option<f64>,
}

impl PlausibilityVerdict {
    fn without_prior(plausible: bool, reason: PlausibilityReason) -> Self {
        Self {
            plausible,
            reason,
            distance_m: None,
            elapsed_secs: None,
            implied_speed_kmh: None,
        }
    }

    /// Whether the caller should queue the check-in for manual review.
    pub fn needs_review(&self) -> bool {
        !self.plausible
    }
}

/// Speed-bound model applied to consecutive position reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibilityScorer {
    max_speed_kmh: f64,
    gps_tolerance_m: f64,
}

impl Default for PlausibilityScorer {
    fn default() -> Self {
        Self::new(&TrustConfig::default())
    }
}

impl PlausibilityScorer {
    pub fn new(config: &TrustConfig) -> Self {
        Self::with_limits(config.max_speed_kmh, config.gps_tolerance_m)
    }

    pub fn with_limits(max_speed_kmh: f64, gps_tolerance_m: f64) -> Self {
        Self {
            max_speed_kmh,
            gps_tolerance_m,
        }
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed_kmh
    }

    /// Score a report given as loose fields.
    pub fn check_plausibility<L: PositionLookup + ?Sized>(
        &self,
        entity_id: &str,
        lat: f64,
        lon: f64,
        observed_at: DateTime<Utc>,
        lookup: &L,
    ) -> PlausibilityVerdict {
        let report = PositionReport::new(entity_id, GeoPoint::new(lat, lon), observed_at);
        self.check(&report, lookup)
    }

    /// Score `report` against the last position `lookup` knows for its entity.
    #[instrument(skip_all, fields(entity_id = %report.entity_id))]
    pub fn check<L: PositionLookup + ?Sized>(
        &self,
        report: &PositionReport,
        lookup: &L,
    ) -> PlausibilityVerdict {
        if !report.point.is_valid() {
            warn!(point = %report.point, "reported coordinates are invalid");
            return PlausibilityVerdict::without_prior(false, PlausibilityReason::InvalidCoordinates);
        }

        let previous = match lookup.last_position(&report.entity_id) {
            LookupOutcome::Found(previous) => previous,
            LookupOutcome::NoPrior => {
                debug!("no prior position, accepting");
                return PlausibilityVerdict::without_prior(true, PlausibilityReason::NoPriorPosition);
            }
            LookupOutcome::Unavailable(detail) => {
                warn!(%detail, "last-position lookup unavailable, failing open");
                return PlausibilityVerdict::without_prior(
                    true,
                    PlausibilityReason::LookupUnavailable,
                );
            }
        };

        if !previous.point.is_valid() {
            warn!(point = %previous.point, "stored last position is invalid, failing open");
            return PlausibilityVerdict::without_prior(true, PlausibilityReason::LookupUnavailable);
        }

        self.score(&previous, report)
    }

    /// Pairwise rule: `previous` then `current`, no lookup involved.
    pub fn score(&self, previous: &PositionReport, current: &PositionReport) -> PlausibilityVerdict {
        let distance = distance_m(previous.point, current.point);
        let elapsed_secs =
            (current.observed_at - previous.observed_at).num_milliseconds() as f64 / 1000.0;

        let mut verdict = PlausibilityVerdict {
            plausible: true,
            reason: PlausibilityReason::WithinGpsTolerance,
            distance_m: Some(distance),
            elapsed_secs: Some(elapsed_secs),
            implied_speed_kmh: None,
        };

        if elapsed_secs > 0.0 {
            verdict.implied_speed_kmh = Some(distance / elapsed_secs * 3.6);
        }

        if distance <= self.gps_tolerance_m {
            debug!(distance, "within GPS tolerance");
            return verdict;
        }

        match verdict.implied_speed_kmh {
            None => {
                verdict.plausible = false;
                verdict.reason = PlausibilityReason::NoElapsedTime;
                warn!(distance, elapsed_secs, "displacement without elapsed time");
            }
            Some(speed) if speed > self.max_speed_kmh => {
                verdict.plausible = false;
                verdict.reason = PlausibilityReason::ExceedsSpeedLimit;
                warn!(
                    distance,
                    elapsed_secs,
                    speed_kmh = speed,
                    max_speed_kmh = self.max_speed_kmh,
                    "implausible movement"
                );
            }
            Some(speed) => {
                verdict.reason = PlausibilityReason::WithinSpeedLimit;
                debug!(distance, elapsed_secs, speed_kmh = speed, "plausible movement");
            }
        }
        verdict
    }
}
