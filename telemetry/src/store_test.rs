#![allow(clippy::float_cmp)]

use super::*;
use crate::model::{GoalStatus, RobotPatch};
use crate::topic::decode_message;

// =============================================================
// Helpers
// =============================================================

fn snapshot_of(robots: &[(&str, RobotPatch)]) -> Snapshot {
    Snapshot { robots: robots.iter().map(|(id, p)| ((*id).to_owned(), p.clone())).collect() }
}

fn battery_update(robot: Option<&str>, value: f64) -> TopicUpdate {
    TopicUpdate { robot: robot.map(str::to_owned), metric: Metric::Battery(value) }
}

fn goal(id: &str, status: GoalStatus) -> Goal {
    Goal { id: id.into(), status, x: 1.0, y: 2.0, time: None, kind: None }
}

// =============================================================
// Snapshots
// =============================================================

#[test]
fn new_store_is_empty() {
    let store = TelemetryStore::default();
    assert_eq!(store.default_robot(), "robot_001");
    assert_eq!(store.robots().count(), 0);
    assert!(store.snapshot().received_at.is_none());
    assert_eq!(store.trends().speed.capacity(), 30);
}

#[test]
fn snapshot_upserts_and_drops_missing_robots() {
    let mut store = TelemetryStore::default();
    store.apply_snapshot_at(
        snapshot_of(&[
            ("a", RobotPatch { battery: Some(50.0), ..Default::default() }),
            ("b", RobotPatch { battery: Some(60.0), ..Default::default() }),
        ]),
        1,
    );
    store.apply_snapshot_at(snapshot_of(&[("b", RobotPatch { speed: Some(0.3), ..Default::default() })]), 2);

    assert!(store.robot("a").is_none());
    let b = store.robot("b").unwrap();
    assert_eq!(b.speed, 0.3);
    assert_eq!(b.battery, 60.0, "absent field keeps prior value");
    assert_eq!(store.snapshot().received_at, Some(2));
}

#[test]
fn empty_snapshot_drops_everyone() {
    let mut store = TelemetryStore::default();
    store.apply_topic_update_at(battery_update(None, 40.0), 1);
    store.apply_snapshot_at(Snapshot::default(), 2);
    assert_eq!(store.robots().count(), 0);
}

#[test]
fn snapshot_appends_default_robot_position_to_path() {
    let mut store = TelemetryStore::default();
    let patch = RobotPatch { position: Some(Position::new(3.0, 4.0)), ..Default::default() };
    store.apply_snapshot_at(snapshot_of(&[("robot_001", patch.clone()), ("other", patch)]), 5);
    assert_eq!(store.trends().path.len(), 1);
    assert_eq!(store.trends().path.latest().unwrap().value, Position::new(3.0, 4.0));
}

// =============================================================
// Topic updates
// =============================================================

#[test]
fn topic_update_touches_only_its_field() {
    let mut store = TelemetryStore::default();
    let patch = RobotPatch { battery: Some(90.0), speed: Some(0.5), ..Default::default() };
    store.apply_snapshot_at(snapshot_of(&[("robot_001", patch)]), 1);
    store.apply_topic_update_at(battery_update(None, 70.0), 2);

    let robot = store.robot("robot_001").unwrap();
    assert_eq!(robot.battery, 70.0);
    assert_eq!(robot.speed, 0.5);
}

#[test]
fn scoped_topic_update_creates_robot() {
    let mut store = TelemetryStore::default();
    store.apply_topic_update_at(battery_update(Some("robot_002"), 33.0), 1);
    assert_eq!(store.robot("robot_002").unwrap().battery, 33.0);
    assert!(store.robot("robot_001").is_none());
    assert!(store.trends().battery.is_empty(), "only the default robot feeds trends");
}

#[test]
fn default_robot_updates_feed_trends() {
    let mut store = TelemetryStore::new("r1", 3);
    store.apply_topic_update_at(TopicUpdate { robot: None, metric: Metric::Speed(0.1) }, 1);
    store.apply_topic_update_at(TopicUpdate { robot: Some("r1".into()), metric: Metric::Speed(0.2) }, 2);
    store.apply_topic_update_at(
        TopicUpdate { robot: None, metric: Metric::Sensors(Sensors { lidar: 1.0, camera: 2.0, ultrasonic: 3.0 }) },
        3,
    );
    let speeds: Vec<f64> = store.trends().speed.iter().map(|s| s.value).collect();
    assert_eq!(speeds, vec![0.1, 0.2]);
    assert_eq!(store.trends().sensors.len(), 1);
}

#[test]
fn interleaved_messages_apply_in_arrival_order() {
    let mut store = TelemetryStore::default();
    let messages = [
        r#"{"robots": {"robot_001": {"battery": 90, "speed": 0.5}}}"#,
        r#"{"topic": "robot/battery", "payload": "80"}"#,
        r#"{"robots": {"robot_001": {"battery": 75}}}"#,
        r#"{"topic": "robot/speed", "payload": "0.9"}"#,
        r#"{"type": "pong"}"#,
    ];
    for (i, raw) in messages.iter().enumerate() {
        store.apply_at(decode_message(raw).unwrap(), i64::try_from(i).unwrap());
    }
    let robot = store.robot("robot_001").unwrap();
    assert_eq!(robot.battery, 75.0);
    assert_eq!(robot.speed, 0.9);
    assert_eq!(store.snapshot().received_at, Some(3));
}

#[test]
fn ignored_inbound_changes_nothing() {
    let mut store = TelemetryStore::default();
    assert!(!store.apply_at(Inbound::Ignored, 1));
    assert!(store.snapshot().received_at.is_none());
}

#[test]
fn append_trend_evicts_oldest() {
    let mut store = TelemetryStore::new("r", 2);
    for (t, v) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
        store.append_trend_at(Metric::Temperature(v), t);
    }
    let temps: Vec<f64> = store.trends().temperature.iter().map(|s| s.value).collect();
    assert_eq!(temps, vec![20.0, 30.0]);
}

// =============================================================
// Goals
// =============================================================

#[test]
fn goal_filters_span_all_robots() {
    let mut store = TelemetryStore::default();
    store.apply_snapshot_at(
        snapshot_of(&[
            (
                "a",
                RobotPatch {
                    goals: Some(vec![goal("g1", GoalStatus::Current), goal("g2", GoalStatus::Completed)]),
                    ..Default::default()
                },
            ),
            (
                "b",
                RobotPatch {
                    goals: Some(vec![goal("g3", GoalStatus::Queued), goal("g4", GoalStatus::Cancelled)]),
                    ..Default::default()
                },
            ),
        ]),
        1,
    );

    let active: Vec<(String, String)> =
        store.active_goals().into_iter().map(|g| (g.robot_id, g.goal.id)).collect();
    assert_eq!(active, vec![("a".into(), "g1".into()), ("b".into(), "g3".into())]);

    let completed = store.completed_goals();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].goal.id, "g2");
}

#[test]
fn robot_goal_serializes_flat() {
    let tagged = RobotGoal { robot_id: "a".into(), goal: goal("g1", GoalStatus::Queued) };
    let value = serde_json::to_value(&tagged).unwrap();
    assert_eq!(value["robot_id"], "a");
    assert_eq!(value["id"], "g1");
    assert_eq!(value["status"], "queued");
}
