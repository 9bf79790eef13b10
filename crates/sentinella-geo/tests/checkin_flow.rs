// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A day of check-ins scored against a file-backed position store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sentinella_core::TrustConfig;
use sentinella_core::types::{GeoPoint, PositionReport};
use sentinella_geo::{
    LookupOutcome, PlausibilityReason, PlausibilityScorer, PositionLookup, SqlitePositionStore,
};

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 6, 30, 0).unwrap()
}

fn check_in(
    scorer: &PlausibilityScorer,
    store: &SqlitePositionStore,
    report: PositionReport,
) -> PlausibilityReason {
    store.check_in(scorer, &report).expect("check in").reason
}

#[test]
fn vendor_day_with_one_spoofed_report() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqlitePositionStore::open(dir.path().join("positions.db")).unwrap();
    let scorer = PlausibilityScorer::new(&TrustConfig::default());
    let vendor = "vendor-42";

    let piazza = GeoPoint::new(44.4937, 11.3430);
    let bolognina = GeoPoint::new(44.5058, 11.3426);
    let rome = GeoPoint::new(41.9028, 12.4964);

    let reasons = [
        check_in(&scorer, &store, PositionReport::new(vendor, piazza, morning())),
        check_in(
            &scorer,
            &store,
            PositionReport::new(vendor, piazza, morning() + Duration::minutes(1)),
        ),
        check_in(
            &scorer,
            &store,
            PositionReport::new(vendor, bolognina, morning() + Duration::minutes(30)),
        ),
        check_in(
            &scorer,
            &store,
            PositionReport::new(vendor, rome, morning() + Duration::minutes(45)),
        ),
        // Scored against Bolognina, not against the spoofed Rome fix.
        check_in(
            &scorer,
            &store,
            PositionReport::new(vendor, piazza, morning() + Duration::minutes(60)),
        ),
    ];

    assert_eq!(
        reasons,
        [
            PlausibilityReason::NoPriorPosition,
            PlausibilityReason::WithinGpsTolerance,
            PlausibilityReason::WithinSpeedLimit,
            PlausibilityReason::ExceedsSpeedLimit,
            PlausibilityReason::WithinSpeedLimit,
        ]
    );
}

#[test]
fn spoofed_fix_does_not_flag_the_return_trip() {
    let store = SqlitePositionStore::open_in_memory().unwrap();
    let scorer = PlausibilityScorer::default();
    let bologna = GeoPoint::new(44.4949, 11.3426);
    let rome = GeoPoint::new(41.9028, 12.4964);

    let reasons = [
        check_in(&scorer, &store, PositionReport::new("vendor-7", bologna, morning())),
        check_in(
            &scorer,
            &store,
            PositionReport::new("vendor-7", rome, morning() + Duration::minutes(10)),
        ),
        check_in(
            &scorer,
            &store,
            PositionReport::new("vendor-7", bologna, morning() + Duration::minutes(20)),
        ),
    ];

    assert_eq!(
        reasons,
        [
            PlausibilityReason::NoPriorPosition,
            PlausibilityReason::ExceedsSpeedLimit,
            PlausibilityReason::WithinGpsTolerance,
        ]
    );
}

#[test]
fn entities_are_scored_independently() {
    let store = SqlitePositionStore::open_in_memory().unwrap();
    let scorer = PlausibilityScorer::default();
    store
        .record(&PositionReport::new(
            "vendor-1",
            GeoPoint::new(41.9028, 12.4964),
            morning(),
        ))
        .unwrap();

    let verdict = scorer.check_plausibility("vendor-2", 44.4937, 11.3430, morning(), &store);
    assert!(verdict.plausible);
    assert_eq!(verdict.reason, PlausibilityReason::NoPriorPosition);
}

struct FlakyStore;

impl PositionLookup for FlakyStore {
    fn last_position(&self, _entity_id: &str) -> LookupOutcome {
        LookupOutcome::Unavailable("database is locked".into())
    }
}

#[test]
fn outage_never_blocks_a_check_in() {
    let verdict = PlausibilityScorer::default().check_plausibility(
        "vendor-42",
        41.9028,
        12.4964,
        morning(),
        &FlakyStore,
    );
    assert!(verdict.plausible);
    assert_eq!(verdict.reason, PlausibilityReason::LookupUnavailable);
}
