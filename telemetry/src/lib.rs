//! Fleet telemetry model, wire decoding and the merged state store.
//!
//! This crate owns the representation of robot telemetry shared by the
//! ingest task, the HTTP read views and the simulator. Inbound text is
//! decoded at the transport boundary into [`topic::Inbound`] values; the
//! [`store::TelemetryStore`] merges them in arrival order and keeps bounded
//! trend history for the dashboard charts.
//!
//! Nothing in here performs I/O or logs. Malformed input comes back as
//! [`topic::DecodeError`] and the caller decides what to do with it.

pub mod model;
pub mod simulate;
pub mod store;
pub mod topic;
pub mod trend;

pub use model::{Goal, GoalStatus, Position, RobotPatch, RobotState, Sensors, Snapshot};
pub use store::{RobotGoal, TelemetrySnapshot, TelemetryStore, Trends};
pub use topic::{DecodeError, Inbound, Metric, TopicUpdate, decode_message, decode_topic};
pub use trend::{Sample, Trend};

/// Robot addressed by unscoped `robot/<metric>` topics.
pub const DEFAULT_ROBOT_ID: &str = "robot_001";

/// Default trend history length.
pub const DEFAULT_TREND_LEN: usize = 30;
