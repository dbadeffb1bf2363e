use std::time::Duration;

use telemetry::decode_message;
use tokio::time::timeout;

use super::*;
use crate::state::test_helpers;

fn inbound(text: &str) -> Inbound {
    decode_message(text).unwrap()
}

#[tokio::test]
async fn messages_apply_in_arrival_order() {
    let (state, _api) = test_helpers::test_app_state();
    let (tx, rx) = mpsc::channel(8);
    let handle = spawn_ingest_task(state.clone(), rx);

    tx.send(inbound(r#"{"robots": {"robot_001": {"battery": 90, "speed": 0.2}, "robot_002": {}}}"#)).await.unwrap();
    tx.send(inbound(r#"{"topic": "robot/battery", "payload": "72.5"}"#)).await.unwrap();
    tx.send(inbound(r#"{"robots": {"robot_001": {"speed": 0.9}}}"#)).await.unwrap();
    tx.send(inbound(r#"{"topic": "robot/robot_001/temperature", "payload": 41}"#)).await.unwrap();
    drop(tx);
    timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();

    let store = state.telemetry.read().await;
    let robot = store.robot("robot_001").unwrap();
    assert!((robot.battery - 72.5).abs() < f64::EPSILON, "later snapshot left battery alone");
    assert!((robot.speed - 0.9).abs() < f64::EPSILON);
    assert!((robot.temperature - 41.0).abs() < f64::EPSILON);
    assert!(store.robot("robot_002").is_none(), "dropped by the second snapshot");
}

#[tokio::test]
async fn ignored_messages_leave_store_untouched() {
    let (state, _api) = test_helpers::test_app_state();

    apply_inbound(&state, Inbound::Ignored).await;

    let store = state.telemetry.read().await;
    assert_eq!(store.snapshot().received_at, None);
}

#[tokio::test]
async fn position_delta_reaches_mission_coverage() {
    let (state, _api) = test_helpers::test_app_state();
    let points = [Point::new(0.0, 0.0), Point::new(200.0, 200.0)];
    state.missions.run_sequence(&points, "robot_001", Duration::from_millis(1)).await.unwrap();

    apply_inbound(&state, inbound(r#"{"topic": "robot/position", "payload": {"x": 150, "y": 150}}"#)).await;
    assert!(!state.missions.status().covered);

    apply_inbound(&state, inbound(r#"{"topic": "robot/position", "payload": [195, 203]}"#)).await;
    assert!(state.missions.status().covered);
}

#[tokio::test]
async fn snapshot_positions_clear_pending_marker() {
    let (state, _api) = test_helpers::test_app_state();
    state.missions.assign_goal(Point::new(120.0, 80.0), "robot_002").await.unwrap();

    apply_inbound(&state, inbound(r#"{"robots": {"robot_002": {"position": [121, 81]}}}"#)).await;

    assert_eq!(state.missions.status().pending_goal, None);
}

#[test]
fn scoped_topic_reports_its_robot() {
    let msg = inbound(r#"{"topic": "robot/robot_007/position", "payload": [1, 2]}"#);
    assert_eq!(reported_positions(&msg, "robot_001"), vec![("robot_007".to_owned(), Point::new(1.0, 2.0))]);

    let msg = inbound(r#"{"topic": "robot/battery", "payload": "50"}"#);
    assert!(reported_positions(&msg, "robot_001").is_empty());
}
