//! Runtime tuning parsed from environment variables.
//!
//! Connection URLs and ports come from the CLI (with `env` fallbacks). The
//! knobs here are rarely changed and fall back to defaults when unset or
//! unparsable.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use telemetry::{DEFAULT_ROBOT_ID, DEFAULT_TREND_LEN};

use crate::goals::mission::DEFAULT_PLAN_CAPACITY;
use crate::stream::backoff::ReconnectPolicy;

pub const DEFAULT_RECONNECT_BASE_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_CAP_MS: u64 = 30_000;
pub const DEFAULT_RECONNECT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_SIMULATE_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    pub reconnect: ReconnectPolicy,
    pub trend_len: usize,
    pub default_robot: String,
    pub simulate_interval: Duration,
    /// Points the HTTP waypoint plan accepts. Validated when the plan is built.
    pub plan_capacity: usize,
}

impl FleetConfig {
    /// Build config from the process environment.
    ///
    /// - `FLEET_RECONNECT_BASE_MS`: default 1000
    /// - `FLEET_RECONNECT_CAP_MS`: default 30000
    /// - `FLEET_RECONNECT_MAX_ATTEMPTS`: default 5
    /// - `FLEET_TREND_LEN`: default 30
    /// - `FLEET_DEFAULT_ROBOT`: default `robot_001`
    /// - `FLEET_SIMULATE_INTERVAL_MS`: default 2000
    /// - `FLEET_PLAN_CAPACITY`: default 4, must be within 2..=10
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let reconnect = ReconnectPolicy {
            base: Duration::from_millis(env_parse(&lookup, "FLEET_RECONNECT_BASE_MS", DEFAULT_RECONNECT_BASE_MS)),
            cap: Duration::from_millis(env_parse(&lookup, "FLEET_RECONNECT_CAP_MS", DEFAULT_RECONNECT_CAP_MS)),
            max_attempts: env_parse(&lookup, "FLEET_RECONNECT_MAX_ATTEMPTS", DEFAULT_RECONNECT_MAX_ATTEMPTS),
        };
        let default_robot = lookup("FLEET_DEFAULT_ROBOT")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ROBOT_ID.to_owned());

        Self {
            reconnect,
            trend_len: env_parse(&lookup, "FLEET_TREND_LEN", DEFAULT_TREND_LEN).max(1),
            default_robot,
            simulate_interval: Duration::from_millis(
                env_parse(&lookup, "FLEET_SIMULATE_INTERVAL_MS", DEFAULT_SIMULATE_INTERVAL_MS).max(1),
            ),
            plan_capacity: env_parse(&lookup, "FLEET_PLAN_CAPACITY", DEFAULT_PLAN_CAPACITY),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Parse `key` through `lookup`, falling back to `default` when unset or invalid.
fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
