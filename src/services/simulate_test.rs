use telemetry::simulate::Simulator;

use super::*;
use crate::state::test_helpers;

#[tokio::test]
async fn tick_feeds_default_robot_and_trends() {
    let (state, _api) = test_helpers::test_app_state();
    let mut simulator = Simulator::seeded(11);

    apply_tick(&state, &mut simulator).await;
    apply_tick(&state, &mut simulator).await;

    let store = state.telemetry.read().await;
    let robot = store.robot(telemetry::DEFAULT_ROBOT_ID).unwrap();
    assert!((20.0..=100.0).contains(&robot.battery));
    let trends = store.trends();
    assert_eq!(trends.battery.len(), 2);
    assert_eq!(trends.temperature.len(), 2);
    assert_eq!(trends.speed.len(), 2);
    assert_eq!(trends.sensors.len(), 2);
    assert!(trends.path.is_empty());
}

#[tokio::test]
async fn spawned_simulator_keeps_ticking() {
    let (state, _api) = test_helpers::test_app_state();
    let handle = spawn_simulator_task(state.clone(), Simulator::seeded(5), Duration::from_millis(5));

    tokio::time::timeout(Duration::from_secs(2), async {
        while state.telemetry.read().await.trends().battery.len() < 3 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("simulator never produced three ticks");
    handle.abort();
}
