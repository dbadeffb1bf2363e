//! Goal and mission commands.
//!
//! Missions are started on a background task and answer `202 Accepted` with
//! the mission id; progress is polled through `GET /api/mission`. Single
//! goals and the Home preset wait for the backend reply. The waypoint plan is
//! built one point at a time and run as a whole.

#[cfg(test)]
#[path = "missions_test.rs"]
mod missions_test;

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use canvas::camera::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::goals::mission::{PATROL_DELAY, PATROL_ROUTE, WAYPOINT_DELAY};
use crate::goals::{MissionError, MissionStatus, WaypointPlan};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EStopBody {
    pub engaged: bool,
}

#[derive(Debug, Deserialize)]
pub struct GoalBody {
    pub x: f64,
    pub y: f64,
    pub robot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoalUpdateBody {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RobotBody {
    pub robot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WaypointsBody {
    pub robot_id: Option<String>,
    pub points: Vec<Point>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PointBody {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunPlanBody {
    pub robot_id: Option<String>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    pub capacity: usize,
    pub points: Vec<Point>,
    pub ready: bool,
}

impl PlanView {
    fn of(plan: &WaypointPlan) -> Self {
        Self { capacity: plan.capacity(), points: plan.points().to_vec(), ready: plan.is_ready() }
    }
}

/// `POST /api/estop` — engage or release the hard stop.
pub async fn estop(State(state): State<AppState>, Json(body): Json<EStopBody>) -> Json<Value> {
    if body.engaged {
        if state.estop.engage() {
            state.missions.cancel().await;
        }
    } else {
        state.estop.release();
    }
    Json(json!({ "engaged": state.estop.is_engaged() }))
}

/// `POST /api/goal` — send one goal.
pub async fn assign_goal(
    State(state): State<AppState>,
    Json(body): Json<GoalBody>,
) -> Result<Json<Value>, StatusCode> {
    let robot_id = robot_or_default(&state, body.robot_id).await;
    let goal_id = state
        .missions
        .assign_goal(Point::new(body.x, body.y), &robot_id)
        .await
        .map_err(mission_error_to_status)?;
    Ok(Json(json!({ "goal_id": goal_id, "robot_id": robot_id })))
}

/// `POST /api/goal/update` — set a backend goal's status.
pub async fn update_goal(
    State(state): State<AppState>,
    Json(body): Json<GoalUpdateBody>,
) -> Result<Json<Value>, StatusCode> {
    state
        .missions
        .update_goal_status(&body.id, &body.status)
        .await
        .map_err(mission_error_to_status)?;
    Ok(Json(json!({ "ok": true })))
}

/// `GET /api/mission` — progress of the current or last mission.
pub async fn status(State(state): State<AppState>) -> Json<MissionStatus> {
    Json(state.missions.status())
}

/// `POST /api/mission/waypoints` — run a user plan.
pub async fn start_waypoints(
    State(state): State<AppState>,
    Json(body): Json<WaypointsBody>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let plan = WaypointPlan::from_points(body.points).map_err(mission_error_to_status)?;
    let delay = body.delay_ms.map_or(WAYPOINT_DELAY, Duration::from_millis);
    let robot_id = robot_or_default(&state, body.robot_id).await;
    start(&state, plan.points().to_vec(), robot_id, delay)
}

/// `GET /api/mission/plan` — the waypoint plan being built.
pub async fn plan(State(state): State<AppState>) -> Json<PlanView> {
    Json(PlanView::of(&state.plan()))
}

/// `POST /api/mission/plan/point` — append a point; 422 once the plan is full.
pub async fn add_plan_point(
    State(state): State<AppState>,
    Json(body): Json<PointBody>,
) -> Result<Json<PlanView>, StatusCode> {
    let mut plan = state.plan();
    plan.push(Point::new(body.x, body.y)).map_err(mission_error_to_status)?;
    Ok(Json(PlanView::of(&plan)))
}

/// `DELETE /api/mission/plan` — drop every planned point.
pub async fn clear_plan(State(state): State<AppState>) -> Json<PlanView> {
    let mut plan = state.plan();
    plan.clear();
    Json(PlanView::of(&plan))
}

/// `POST /api/mission/plan/run` — run the plan as a waypoint mission. The
/// plan is kept so it can be run again.
pub async fn run_plan(
    State(state): State<AppState>,
    Json(body): Json<RunPlanBody>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let robot_id = robot_or_default(&state, body.robot_id).await;
    let points = {
        let plan = state.plan();
        if !plan.is_ready() {
            return Err(mission_error_to_status(MissionError::TooFewPoints(plan.points().len())));
        }
        plan.points().to_vec()
    };
    let delay = body.delay_ms.map_or(WAYPOINT_DELAY, Duration::from_millis);
    start(&state, points, robot_id, delay)
}

/// `POST /api/mission/patrol` — run the patrol preset.
pub async fn start_patrol(
    State(state): State<AppState>,
    Json(body): Json<RobotBody>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let robot_id = robot_or_default(&state, body.robot_id).await;
    start(&state, PATROL_ROUTE.to_vec(), robot_id, PATROL_DELAY)
}

/// `POST /api/mission/home` — send the Home goal.
pub async fn go_home(
    State(state): State<AppState>,
    Json(body): Json<RobotBody>,
) -> Result<Json<Value>, StatusCode> {
    let robot_id = robot_or_default(&state, body.robot_id).await;
    let goal_id = state.missions.go_home(&robot_id).await.map_err(mission_error_to_status)?;
    Ok(Json(json!({ "goal_id": goal_id, "robot_id": robot_id })))
}

/// `POST /api/mission/stop` — interrupt and cancel.
pub async fn stop(State(state): State<AppState>) -> Json<MissionStatus> {
    state.missions.cancel().await;
    Json(state.missions.status())
}

fn start(
    state: &AppState,
    points: Vec<Point>,
    robot_id: String,
    delay: Duration,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let total = points.len();
    let id = state.missions.start(points, robot_id.clone(), delay).map_err(mission_error_to_status)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "mission_id": id, "robot_id": robot_id, "total": total }))))
}

async fn robot_or_default(state: &AppState, robot_id: Option<String>) -> String {
    match robot_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => state.telemetry.read().await.default_robot().to_owned(),
    }
}

pub(crate) fn mission_error_to_status(err: MissionError) -> StatusCode {
    match err {
        MissionError::TooFewPoints(_) | MissionError::PlanFull(_) | MissionError::InvalidCapacity(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        MissionError::Busy => StatusCode::CONFLICT,
        MissionError::HardStop => StatusCode::LOCKED,
        MissionError::Goal(e) => {
            warn!(error = %e, "goal API request failed");
            StatusCode::BAD_GATEWAY
        }
    }
}
