// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trust-layer configuration.
//
// Only non-secret tunables live here. The secret itself is read by
// `sentinella_security::KeySource`, which names the variable via
// `secret_env_var`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default environment variable holding the operator secret.
pub const DEFAULT_SECRET_ENV_VAR: &str = "SENTINELLA_SECRET";

/// Tunables for token lifetime and plausibility scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Environment variable the secret is read from.
    pub secret_env_var: String,
    /// Lifetime of freshly issued capability tokens, in seconds.
    pub token_ttl_secs: u64,
    /// Highest average speed (km/h) between two reports still considered plausible.
    pub max_speed_kmh: f64,
    /// Displacement (metres) below which a report is always plausible.
    pub gps_tolerance_m: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            secret_env_var: DEFAULT_SECRET_ENV_VAR.to_owned(),
            token_ttl_secs: 300,
            max_speed_kmh: 120.0,
            gps_tolerance_m: 100.0,
        }
    }
}

impl TrustConfig {
    /// Defaults overlaid with `SENTINELLA_TOKEN_TTL_SECS`,
    /// `SENTINELLA_MAX_SPEED_KMH` and `SENTINELLA_GPS_TOLERANCE_M`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`TrustConfig::from_env`] but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = parsed(&lookup, "SENTINELLA_TOKEN_TTL_SECS") {
            config.token_ttl_secs = v;
        }
        if let Some(v) = parsed::<f64>(&lookup, "SENTINELLA_MAX_SPEED_KMH") {
            if v > 0.0 && v.is_finite() {
                config.max_speed_kmh = v;
            } else {
                warn!(var = "SENTINELLA_MAX_SPEED_KMH", "ignoring non-positive speed");
            }
        }
        if let Some(v) = parsed::<f64>(&lookup, "SENTINELLA_GPS_TOLERANCE_M") {
            if v >= 0.0 && v.is_finite() {
                config.gps_tolerance_m = v;
            } else {
                warn!(var = "SENTINELLA_GPS_TOLERANCE_M", "ignoring negative tolerance");
            }
        }
        config
    }

    /// `max_speed_kmh` in metres per second.
    pub fn max_speed_mps(&self) -> f64 {
        self.max_speed_kmh / 3.6
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, "ignoring unparseable value");
            None
        }
    }
}
