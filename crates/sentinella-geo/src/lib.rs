// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sentinella — geospatial anti-fraud signals for physical check-ins.

pub mod distance;
pub mod plausibility;
pub mod store;

pub use distance::{EARTH_RADIUS_M, distance_m, haversine_m};
pub use plausibility::{
    LookupOutcome, PlausibilityReason, PlausibilityScorer, PlausibilityVerdict, PositionLookup,
};
pub use store::SqlitePositionStore;
