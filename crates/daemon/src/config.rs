// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration: defaults plus environment-variable overrides.

use std::time::Duration;

use fleet_placement::PlacementConfig;

/// Default TCP address the coordinator listens on.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7177";

/// Default interval between liveness sweeps (§9 Open Question 1).
const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(30);

/// Default bound on how long a single request is allowed to take to read or write.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinator-wide tunables. `Default` matches the source's hardcoded
/// constants; every field can be overridden via `FLEET_*` environment
/// variables through [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub request_timeout: Duration,
    pub reaper_interval: Duration,
    pub placement: PlacementConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reaper_interval: DEFAULT_REAPER_INTERVAL,
            placement: PlacementConfig::default(),
        }
    }
}

impl Config {
    /// Builds a `Config` from defaults, overridden by any `FLEET_*`
    /// environment variables that are set. Unparseable overrides are
    /// ignored in favor of the default (never a startup failure).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("FLEET_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(ms) = env_u64("FLEET_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("FLEET_REAPER_INTERVAL_MS") {
            config.reaper_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("FLEET_AGENT_DEAD_TIMEOUT_MS") {
            config.placement.agent_dead_timeout_ms = ms;
        }
        if let Some(usd) = env_f64("FLEET_CHOOSER_PRICE_TOLERANCE_USD") {
            config.placement.tolerances.price_tolerance_usd_per_hour = usd;
        }
        if let Some(points) = env_f64("FLEET_CHOOSER_INTERRUPTION_TOLERANCE_POINTS") {
            config.placement.tolerances.interruption_tolerance_points = points;
        }

        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
