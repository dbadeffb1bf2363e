//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard front end reads merged telemetry and connection state from
//! here and issues goal, mission and feed commands. Reads are cheap clones
//! under the store's read lock; mission commands go through the coordinator.

pub mod missions;
pub mod streams;
pub mod views;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/connection", get(views::connection))
        .route("/api/stream/connect", post(streams::connect))
        .route("/api/stream/disconnect", post(streams::disconnect))
        .route("/api/telemetry", get(views::snapshot))
        .route("/api/telemetry/trends", get(views::trends))
        .route("/api/goals", get(views::goals))
        .route("/api/estop", post(missions::estop))
        .route("/api/goal", post(missions::assign_goal))
        .route("/api/goal/update", post(missions::update_goal))
        .route("/api/mission", get(missions::status))
        .route("/api/mission/waypoints", post(missions::start_waypoints))
        .route("/api/mission/plan", get(missions::plan).delete(missions::clear_plan))
        .route("/api/mission/plan/point", post(missions::add_plan_point))
        .route("/api/mission/plan/run", post(missions::run_plan))
        .route("/api/mission/patrol", post(missions::start_patrol))
        .route("/api/mission/home", post(missions::go_home))
        .route("/api/mission/stop", post(missions::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
