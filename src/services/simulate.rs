//! Demo telemetry source.
//!
//! When no live robot is reachable the binary can feed the store from a
//! [`telemetry::simulate::Simulator`]. Ticks go through the same store path as
//! decoded topic updates.

#[cfg(test)]
#[path = "simulate_test.rs"]
mod simulate_test;

use std::time::Duration;

use rand::Rng;
use telemetry::simulate::Simulator;
use tokio::task::JoinHandle;
use tracing::info;

use crate::state::AppState;

/// Spawn the simulator task, ticking every `period`.
pub fn spawn_simulator_task<R>(state: AppState, simulator: Simulator<R>, period: Duration) -> JoinHandle<()>
where
    R: Rng + Send + 'static,
{
    info!(period_ms = period.as_millis(), "telemetry simulator running");
    tokio::spawn(async move {
        let mut simulator = simulator;
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            apply_tick(&state, &mut simulator).await;
        }
    })
}

/// Advance the simulator once and apply its updates.
pub async fn apply_tick<R: Rng>(state: &AppState, simulator: &mut Simulator<R>) {
    let updates = simulator.tick();
    let mut store = state.telemetry.write().await;
    for update in updates {
        store.apply_topic_update(update);
    }
}
