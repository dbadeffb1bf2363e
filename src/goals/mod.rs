//! Goal dispatch: the backend REST client and the mission coordinator.

pub mod api;
pub mod mission;

pub use api::{GoalApi, GoalError, HttpGoalApi};
pub use mission::{MissionCoordinator, MissionError, MissionReport, MissionStatus, WaypointPlan};
