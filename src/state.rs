//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! handed to the background tasks. The telemetry store sits behind one
//! `RwLock`: the ingest and simulator tasks write, handlers read and clone.
//! Connection status and the hard stop travel over `watch` channels so every
//! holder sees the latest value without polling. The feeds live here so a
//! handler can reconnect them after a hard stop or an exhausted retry budget.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use telemetry::TelemetryStore;
use tokio::sync::{RwLock, watch};
use tracing::warn;

use crate::goals::{GoalApi, MissionCoordinator, WaypointPlan};
use crate::stream::feeds::Feeds;

// =============================================================================
// HARD STOP
// =============================================================================

/// Process-wide emergency stop flag.
///
/// Engaging it interrupts the running mission, refuses new missions and
/// closes the stream connections. Releasing it only lifts the refusal; the
/// feeds stay closed until connected again.
#[derive(Clone)]
pub struct EStop {
    tx: Arc<watch::Sender<bool>>,
}

impl EStop {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Returns `true` if the flag changed.
    pub fn engage(&self) -> bool {
        let changed = !self.tx.send_replace(true);
        if changed {
            warn!("hard stop engaged");
        }
        changed
    }

    /// Returns `true` if the flag changed.
    pub fn release(&self) -> bool {
        let changed = self.tx.send_replace(false);
        if changed {
            warn!("hard stop released");
        }
        changed
    }

    #[must_use]
    pub fn is_engaged(&self) -> bool {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for EStop {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; every field is a
/// handle.
#[derive(Clone)]
pub struct AppState {
    pub telemetry: Arc<RwLock<TelemetryStore>>,
    /// Backend feed and the optional topic relay.
    pub feeds: Arc<Feeds>,
    pub estop: EStop,
    pub missions: Arc<MissionCoordinator>,
    /// Waypoints collected from the map, run as one mission on request.
    pub plan: Arc<Mutex<WaypointPlan>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: TelemetryStore,
        api: Arc<dyn GoalApi>,
        estop: EStop,
        feeds: Feeds,
        plan: WaypointPlan,
    ) -> Self {
        let missions = Arc::new(MissionCoordinator::new(api, estop.subscribe()));
        Self {
            telemetry: Arc::new(RwLock::new(store)),
            feeds: Arc::new(feeds),
            estop,
            missions,
            plan: Arc::new(Mutex::new(plan)),
        }
    }

    /// Lock the waypoint plan. Never held across an await.
    #[must_use]
    pub fn plan(&self) -> MutexGuard<'_, WaypointPlan> {
        self.plan.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
