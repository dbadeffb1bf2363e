//! Merged telemetry state.
//!
//! DESIGN
//! ======
//! The store is a plain `&mut self` structure applied strictly in arrival
//! order. Snapshots are authoritative for robot membership; topic deltas touch
//! exactly one field of one robot. Trend history follows the default robot,
//! the one the diagnostics charts track.
//!
//! Every mutating call has an `_at` variant taking the current time in
//! milliseconds so tests can pin timestamps.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::model::{Goal, GoalStatus, Position, RobotState, Sensors, Snapshot};
use crate::topic::{Inbound, Metric, TopicUpdate};
use crate::trend::Trend;
use crate::{DEFAULT_ROBOT_ID, DEFAULT_TREND_LEN};

/// Bounded chart history for the default robot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub speed: Trend<f64>,
    pub battery: Trend<f64>,
    pub temperature: Trend<f64>,
    pub path: Trend<Position>,
    pub sensors: Trend<Sensors>,
}

impl Trends {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            speed: Trend::new(len),
            battery: Trend::new(len),
            temperature: Trend::new(len),
            path: Trend::new(len),
            sensors: Trend::new(len),
        }
    }
}

/// Read view of the merged state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub robots: BTreeMap<String, RobotState>,
    /// When the last inbound message was applied.
    pub received_at: Option<i64>,
}

/// A goal tagged with the robot that owns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotGoal {
    pub robot_id: String,
    #[serde(flatten)]
    pub goal: Goal,
}

#[derive(Debug, Clone)]
pub struct TelemetryStore {
    robots: BTreeMap<String, RobotState>,
    trends: Trends,
    default_robot: String,
    received_at: Option<i64>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROBOT_ID, DEFAULT_TREND_LEN)
    }
}

impl TelemetryStore {
    #[must_use]
    pub fn new(default_robot: impl Into<String>, trend_len: usize) -> Self {
        Self {
            robots: BTreeMap::new(),
            trends: Trends::new(trend_len),
            default_robot: default_robot.into(),
            received_at: None,
        }
    }

    // --- Mutations ---

    /// Apply any decoded inbound message. Returns whether state changed.
    pub fn apply(&mut self, inbound: Inbound) -> bool {
        self.apply_at(inbound, now_ms())
    }

    pub fn apply_at(&mut self, inbound: Inbound, now: i64) -> bool {
        match inbound {
            Inbound::Snapshot(snapshot) => {
                self.apply_snapshot_at(snapshot, now);
                true
            }
            Inbound::Topic(update) => {
                self.apply_topic_update_at(update, now);
                true
            }
            Inbound::Ignored => false,
        }
    }

    /// Authoritative merge: robots missing from `snapshot` are dropped, the
    /// rest are upserted field by field.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.apply_snapshot_at(snapshot, now_ms());
    }

    pub fn apply_snapshot_at(&mut self, snapshot: Snapshot, now: i64) {
        self.robots.retain(|id, _| snapshot.robots.contains_key(id));
        for (id, patch) in snapshot.robots {
            self.robots.entry(id).or_default().merge(patch);
        }
        if let Some(position) = self.robots.get(&self.default_robot).map(|r| r.position) {
            self.trends.path.push(now, position);
        }
        self.received_at = Some(now);
    }

    /// Update the single field named by `update`, creating the robot if needed.
    pub fn apply_topic_update(&mut self, update: TopicUpdate) {
        self.apply_topic_update_at(update, now_ms());
    }

    pub fn apply_topic_update_at(&mut self, update: TopicUpdate, now: i64) {
        let id = update.robot.unwrap_or_else(|| self.default_robot.clone());
        let robot = self.robots.entry(id.clone()).or_default();
        match update.metric {
            Metric::Speed(v) => robot.speed = v,
            Metric::Battery(v) => robot.battery = v,
            Metric::Temperature(v) => robot.temperature = v,
            Metric::Position(p) => robot.position = p,
            Metric::Sensors(s) => robot.sensors = s,
        }
        if id == self.default_robot {
            self.append_trend_at(update.metric, now);
        }
        self.received_at = Some(now);
    }

    /// Push a sample into the trend series matching `metric`.
    pub fn append_trend(&mut self, metric: Metric) {
        self.append_trend_at(metric, now_ms());
    }

    pub fn append_trend_at(&mut self, metric: Metric, now: i64) {
        match metric {
            Metric::Speed(v) => self.trends.speed.push(now, v),
            Metric::Battery(v) => self.trends.battery.push(now, v),
            Metric::Temperature(v) => self.trends.temperature.push(now, v),
            Metric::Position(p) => self.trends.path.push(now, p),
            Metric::Sensors(s) => self.trends.sensors.push(now, s),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn default_robot(&self) -> &str {
        &self.default_robot
    }

    #[must_use]
    pub fn robot(&self, id: &str) -> Option<&RobotState> {
        self.robots.get(id)
    }

    pub fn robots(&self) -> impl Iterator<Item = (&str, &RobotState)> {
        self.robots.iter().map(|(id, r)| (id.as_str(), r))
    }

    #[must_use]
    pub fn trends(&self) -> &Trends {
        &self.trends
    }

    /// Clone of the merged state for readers.
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot { robots: self.robots.clone(), received_at: self.received_at }
    }

    /// Current and queued goals across all robots.
    #[must_use]
    pub fn active_goals(&self) -> Vec<RobotGoal> {
        self.goals_where(|g| g.status.is_active())
    }

    #[must_use]
    pub fn completed_goals(&self) -> Vec<RobotGoal> {
        self.goals_where(|g| g.status == GoalStatus::Completed)
    }

    fn goals_where(&self, keep: impl Fn(&Goal) -> bool) -> Vec<RobotGoal> {
        let keep = &keep;
        self.robots
            .iter()
            .flat_map(move |(id, robot)| {
                robot
                    .goals
                    .iter()
                    .filter(move |g| keep(g))
                    .map(move |g| RobotGoal { robot_id: id.clone(), goal: g.clone() })
            })
            .collect()
    }
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
