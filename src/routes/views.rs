//! Read views over the merged telemetry and the stream connections.

#[cfg(test)]
#[path = "views_test.rs"]
mod views_test;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use telemetry::{RobotGoal, TelemetrySnapshot, Trends};

use crate::state::AppState;
use crate::stream::StreamConnection;
use crate::stream::feeds::Feed;

#[derive(Debug, Serialize)]
pub struct ConnectionView {
    pub backend: StreamConnection,
    pub relay: Option<StreamConnection>,
    pub estop: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalTab {
    #[default]
    Active,
    Completed,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoalsQuery {
    #[serde(default)]
    pub tab: GoalTab,
}

impl ConnectionView {
    #[must_use]
    pub fn of(state: &AppState) -> Self {
        Self {
            backend: state.feeds.backend().status(),
            relay: state.feeds.relay().map(Feed::status),
            estop: state.estop.is_engaged(),
        }
    }
}

/// `GET /api/connection` — connectivity indicator.
pub async fn connection(State(state): State<AppState>) -> Json<ConnectionView> {
    Json(ConnectionView::of(&state))
}

/// `GET /api/telemetry` — every robot's merged state.
pub async fn snapshot(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    Json(state.telemetry.read().await.snapshot())
}

/// `GET /api/telemetry/trends` — chart history of the default robot.
pub async fn trends(State(state): State<AppState>) -> Json<Trends> {
    Json(state.telemetry.read().await.trends().clone())
}

/// `GET /api/goals?tab=active|completed` — goals across all robots.
pub async fn goals(State(state): State<AppState>, Query(query): Query<GoalsQuery>) -> Json<Vec<RobotGoal>> {
    let store = state.telemetry.read().await;
    Json(match query.tab {
        GoalTab::Active => store.active_goals(),
        GoalTab::Completed => store.completed_goals(),
    })
}
