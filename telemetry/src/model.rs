//! Robot telemetry types.
//!
//! Wire shapes follow the fleet backend: snapshots carry a `robots` map whose
//! entries may omit any field, positions arrive either as `[x, y]` or
//! `{"x": .., "y": ..}`, and sensor readings use capitalised keys.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A map position in canvas units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PositionRepr")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

impl From<PositionRepr> for Position {
    fn from(repr: PositionRepr) -> Self {
        match repr {
            PositionRepr::Pair([x, y]) | PositionRepr::Object { x, y } => Self { x, y },
        }
    }
}

/// Latest range-sensor readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    #[serde(rename = "Lidar", default)]
    pub lidar: f64,
    #[serde(rename = "Camera", default)]
    pub camera: f64,
    #[serde(rename = "Ultrasonic", default)]
    pub ultrasonic: f64,
}

/// Backend goal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Current,
    Queued,
    Completed,
    Cancelled,
    #[serde(other)]
    Other,
}

impl GoalStatus {
    /// Current or queued.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Current | Self::Queued)
    }
}

/// A navigation goal as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub status: GoalStatus,
    pub x: f64,
    pub y: f64,
    /// Wall-clock label of the last status change.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Merged state of one robot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RobotState {
    pub position: Position,
    pub orientation: f64,
    pub speed: f64,
    pub battery: f64,
    pub temperature: f64,
    pub sensors: Sensors,
    pub current_task: Option<String>,
    pub last_updated: Option<String>,
    pub goals: Vec<Goal>,
}

impl RobotState {
    /// Overwrite every field present in `patch`; absent fields keep their value.
    pub fn merge(&mut self, patch: RobotPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(orientation) = patch.orientation {
            self.orientation = orientation;
        }
        if let Some(speed) = patch.speed {
            self.speed = speed;
        }
        if let Some(battery) = patch.battery {
            self.battery = battery;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(sensors) = patch.sensors {
            self.sensors = sensors;
        }
        if patch.current_task.is_some() {
            self.current_task = patch.current_task;
        }
        if patch.last_updated.is_some() {
            self.last_updated = patch.last_updated;
        }
        if let Some(goals) = patch.goals {
            self.goals = goals;
        }
    }
}

/// One robot entry of a snapshot. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotPatch {
    pub position: Option<Position>,
    pub orientation: Option<f64>,
    pub speed: Option<f64>,
    pub battery: Option<f64>,
    pub temperature: Option<f64>,
    pub sensors: Option<Sensors>,
    pub current_task: Option<String>,
    pub last_updated: Option<String>,
    pub goals: Option<Vec<Goal>>,
}

/// Full-state message from the duplex feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    pub robots: BTreeMap<String, RobotPatch>,
}
