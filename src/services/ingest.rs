//! Ingest task: the single writer for stream traffic.
//!
//! DESIGN
//! ======
//! Both stream clients forward decoded messages into one mpsc channel. This
//! task drains it in arrival order, applies each message under the store's
//! write lock, then reports any robot positions to the mission coordinator
//! for coverage detection. The lock is released before the coordinator runs.

#[cfg(test)]
#[path = "ingest_test.rs"]
mod ingest_test;

use canvas::camera::Point;
use telemetry::{Inbound, Metric, Position, TopicUpdate};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::state::AppState;

/// Spawn the ingest task. It ends once every sender is dropped.
pub fn spawn_ingest_task(state: AppState, mut rx: mpsc::Receiver<Inbound>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(inbound) = rx.recv().await {
            apply_inbound(&state, inbound).await;
        }
        info!("ingest channel closed");
    })
}

/// Apply one message and forward the positions it carries.
pub async fn apply_inbound(state: &AppState, inbound: Inbound) {
    let positions = {
        let mut store = state.telemetry.write().await;
        let positions = reported_positions(&inbound, store.default_robot());
        if !store.apply(inbound) {
            return;
        }
        positions
    };

    for (robot_id, position) in positions {
        debug!(robot_id, x = position.x, y = position.y, "position");
        state.missions.observe_position(&robot_id, position);
    }
}

fn reported_positions(inbound: &Inbound, default_robot: &str) -> Vec<(String, Point)> {
    match inbound {
        Inbound::Snapshot(snapshot) => snapshot
            .robots
            .iter()
            .filter_map(|(id, patch)| patch.position.map(|p| (id.clone(), to_point(p))))
            .collect(),
        Inbound::Topic(TopicUpdate { robot, metric: Metric::Position(p) }) => {
            vec![(robot.clone().unwrap_or_else(|| default_robot.to_owned()), to_point(*p))]
        }
        Inbound::Topic(_) | Inbound::Ignored => Vec::new(),
    }
}

fn to_point(p: Position) -> Point {
    Point::new(p.x, p.y)
}
