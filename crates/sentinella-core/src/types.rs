// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by the security and geo crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// One observed position of an entity (vendor, device, ...).
///
/// Used both for the report being scored and for the last known position
/// the caller retrieves from its own storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub entity_id: String,
    pub point: GeoPoint,
    pub observed_at: DateTime<Utc>,
}

impl PositionReport {
    pub fn new(entity_id: impl Into<String>, point: GeoPoint, observed_at: DateTime<Utc>) -> Self {
        Self {
            entity_id: entity_id.into(),
            point,
            observed_at,
        }
    }
}

/// The physical actions a capability token can authorise.
///
/// Serialized internally tagged, so a token minted for one action never
/// deserializes as another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityPayload {
    /// Vendor may check in at a specific stall of a specific market.
    StallCheckIn {
        vendor_id: u64,
        stall_id: u64,
        market_id: u64,
    },
    /// Vendor identity badge shown to inspectors.
    VendorBadge { vendor_id: u64 },
}

impl CapabilityPayload {
    /// The vendor the capability was issued to.
    pub fn vendor_id(&self) -> u64 {
        match self {
            Self::StallCheckIn { vendor_id, .. } | Self::VendorBadge { vendor_id } => *vendor_id,
        }
    }
}
