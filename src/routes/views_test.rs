use telemetry::{GoalStatus, decode_message};

use super::*;
use crate::state::test_helpers;
use crate::stream::ConnectionState;

async fn seed(state: &AppState, text: &str) {
    state.telemetry.write().await.apply(decode_message(text).unwrap());
}

#[tokio::test]
async fn connection_reports_backend_and_estop() {
    let (state, _api) = test_helpers::test_app_state();
    state.estop.engage();

    let Json(view) = connection(State(state)).await;

    assert_eq!(view.backend.state, ConnectionState::Closed);
    assert!(view.relay.is_none());
    assert!(view.estop);
}

#[tokio::test]
async fn snapshot_returns_merged_robots() {
    let (state, _api) = test_helpers::test_app_state();
    seed(&state, r#"{"robots": {"robot_001": {"battery": 64, "currentTask": "patrol"}}}"#).await;

    let Json(view) = snapshot(State(state)).await;

    let robot = &view.robots["robot_001"];
    assert!((robot.battery - 64.0).abs() < f64::EPSILON);
    assert_eq!(robot.current_task.as_deref(), Some("patrol"));
    assert!(view.received_at.is_some());
}

#[tokio::test]
async fn trends_follow_topic_updates() {
    let (state, _api) = test_helpers::test_app_state();
    seed(&state, r#"{"topic": "robot/speed", "payload": "0.4"}"#).await;
    seed(&state, r#"{"topic": "robot/speed", "payload": "0.6"}"#).await;

    let Json(view) = trends(State(state)).await;

    let speeds: Vec<f64> = view.speed.iter().map(|s| s.value).collect();
    assert_eq!(speeds, vec![0.4, 0.6]);
}

#[tokio::test]
async fn goals_tab_selects_active_or_completed() {
    let (state, _api) = test_helpers::test_app_state();
    seed(
        &state,
        r#"{"robots": {
            "robot_001": {"goals": [
                {"id": "goal_1", "status": "current", "x": 10, "y": 20, "time": "10:00:01"},
                {"id": "goal_2", "status": "completed", "x": 30, "y": 40}
            ]},
            "robot_002": {"goals": [{"id": "goal_3", "status": "queued", "x": 5, "y": 5}]}
        }}"#,
    )
    .await;

    let Json(active) = goals(State(state.clone()), Query(GoalsQuery::default())).await;
    let ids: Vec<&str> = active.iter().map(|g| g.goal.id.as_str()).collect();
    assert_eq!(ids, vec!["goal_1", "goal_3"]);

    let Json(done) = goals(State(state), Query(GoalsQuery { tab: GoalTab::Completed })).await;
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].robot_id, "robot_001");
    assert_eq!(done[0].goal.status, GoalStatus::Completed);
}

#[test]
fn goal_tab_parses_lowercase() {
    let q: GoalsQuery = serde_json::from_str(r#"{"tab": "completed"}"#).unwrap();
    assert_eq!(q.tab, GoalTab::Completed);
    let q: GoalsQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(q.tab, GoalTab::Active);
}
