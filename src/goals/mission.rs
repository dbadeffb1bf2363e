//! Mission coordinator: single goals, waypoint sequences and presets.
//!
//! DESIGN
//! ======
//! A mission dispatches its points one at a time through the [`GoalApi`],
//! pausing between dispatches. Only one mission runs at a time. The wait is
//! raced against two `watch` flags: the coordinator's interrupt (set by
//! [`MissionCoordinator::cancel`]) and the shared hard stop. The interrupt
//! flag is also checked right after each dispatch so a cancel that lands
//! while a request is in flight stops the next one.
//!
//! Coverage is reactive: the ingest task reports robot positions through
//! [`MissionCoordinator::observe_position`], which flips `covered` once the
//! mission robot is close enough to the final target.
//!
//! ERROR HANDLING
//! ==============
//! Dispatch failures end the mission and propagate. Cancel requests to the
//! backend are best effort and only logged.

#[cfg(test)]
#[path = "mission_test.rs"]
mod mission_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use canvas::camera::Point;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::api::{GoalApi, GoalError};
use crate::stream::raised;

pub const HOME: Point = Point { x: 400.0, y: 300.0 };

pub const PATROL_ROUTE: [Point; 8] = [
    Point { x: 50.0, y: 50.0 },
    Point { x: 50.0, y: 350.0 },
    Point { x: 375.0, y: 350.0 },
    Point { x: 700.0, y: 350.0 },
    Point { x: 700.0, y: 200.0 },
    Point { x: 700.0, y: 100.0 },
    Point { x: 375.0, y: 50.0 },
    Point { x: 50.0, y: 50.0 },
];

pub const PATROL_DELAY: Duration = Duration::from_millis(700);
pub const WAYPOINT_DELAY: Duration = Duration::from_millis(600);

/// A mission is covered once the robot is strictly closer than this to the final target.
pub const COVERAGE_TOLERANCE: f64 = 10.0;
/// The pending single-goal marker clears once any robot is strictly closer than this.
pub const MARKER_TOLERANCE: f64 = 5.0;

pub const MIN_WAYPOINTS: usize = 2;
pub const MAX_WAYPOINTS: usize = 10;
pub const DEFAULT_PLAN_CAPACITY: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("a mission needs at least {MIN_WAYPOINTS} points, got {0}")]
    TooFewPoints(usize),
    #[error("another mission is already running")]
    Busy,
    #[error("hard stop engaged")]
    HardStop,
    #[error("waypoint plan is full ({0} points)")]
    PlanFull(usize),
    #[error("plan capacity must be within {MIN_WAYPOINTS}..={MAX_WAYPOINTS}, got {0}")]
    InvalidCapacity(usize),
    #[error(transparent)]
    Goal(#[from] GoalError),
}

// =============================================================================
// WAYPOINT PLAN
// =============================================================================

/// User-built list of mission points with a fixed capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointPlan {
    capacity: usize,
    points: Vec<Point>,
}

impl Default for WaypointPlan {
    fn default() -> Self {
        Self { capacity: DEFAULT_PLAN_CAPACITY, points: Vec::with_capacity(DEFAULT_PLAN_CAPACITY) }
    }
}

impl WaypointPlan {
    /// # Errors
    ///
    /// Returns [`MissionError::InvalidCapacity`] outside `2..=10`.
    pub fn new(capacity: usize) -> Result<Self, MissionError> {
        if !(MIN_WAYPOINTS..=MAX_WAYPOINTS).contains(&capacity) {
            return Err(MissionError::InvalidCapacity(capacity));
        }
        Ok(Self { capacity, points: Vec::with_capacity(capacity) })
    }

    /// Plan sized to hold `points` exactly, rejected if there are too many or too few.
    ///
    /// # Errors
    ///
    /// [`MissionError::TooFewPoints`] below two points, [`MissionError::PlanFull`] above ten.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Result<Self, MissionError> {
        let points: Vec<Point> = points.into_iter().collect();
        if points.len() < MIN_WAYPOINTS {
            return Err(MissionError::TooFewPoints(points.len()));
        }
        if points.len() > MAX_WAYPOINTS {
            return Err(MissionError::PlanFull(MAX_WAYPOINTS));
        }
        Ok(Self { capacity: points.len(), points })
    }

    /// # Errors
    ///
    /// Returns [`MissionError::PlanFull`] once the plan holds `capacity` points.
    pub fn push(&mut self, point: Point) -> Result<(), MissionError> {
        if self.points.len() >= self.capacity {
            return Err(MissionError::PlanFull(self.capacity));
        }
        self.points.push(point);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.points.len() >= MIN_WAYPOINTS
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Observable mission progress plus the pending single-goal marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissionStatus {
    pub id: Option<Uuid>,
    pub robot_id: Option<String>,
    pub active: bool,
    pub dispatched: usize,
    pub total: usize,
    pub covered: bool,
    pub interrupted: bool,
    pub pending_goal: Option<Point>,
}

/// Outcome of one finished mission run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionReport {
    pub id: Uuid,
    pub robot_id: String,
    pub dispatched: usize,
    pub total: usize,
    pub interrupted: bool,
}

#[derive(Debug)]
struct Mission {
    id: Uuid,
    robot_id: String,
    target: Point,
    total: usize,
    dispatched: usize,
    active: bool,
    covered: bool,
    interrupted: bool,
}

#[derive(Debug, Default)]
struct Inner {
    mission: Option<Mission>,
    pending_goal: Option<Point>,
}

enum Wait {
    Elapsed,
    Interrupted,
    HardStop,
}

// =============================================================================
// COORDINATOR
// =============================================================================

pub struct MissionCoordinator {
    api: Arc<dyn GoalApi>,
    inner: Mutex<Inner>,
    interrupt: watch::Sender<bool>,
    hard_stop: watch::Receiver<bool>,
}

impl MissionCoordinator {
    pub fn new(api: Arc<dyn GoalApi>, hard_stop: watch::Receiver<bool>) -> Self {
        let (interrupt, _) = watch::channel(false);
        Self { api, inner: Mutex::new(Inner::default()), interrupt, hard_stop }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn status(&self) -> MissionStatus {
        let inner = self.lock();
        let mut status = MissionStatus { pending_goal: inner.pending_goal, ..MissionStatus::default() };
        if let Some(m) = &inner.mission {
            status.id = Some(m.id);
            status.robot_id = Some(m.robot_id.clone());
            status.active = m.active;
            status.dispatched = m.dispatched;
            status.total = m.total;
            status.covered = m.covered;
            status.interrupted = m.interrupted;
        }
        status
    }

    /// Send one goal and remember it as the pending marker.
    ///
    /// # Errors
    ///
    /// Propagates the goal API failure; the marker is left untouched then.
    pub async fn assign_goal(&self, target: Point, robot_id: &str) -> Result<Option<String>, MissionError> {
        let goal_id = self.api.add_goal(target, robot_id).await?;
        self.lock().pending_goal = Some(target);
        info!(robot_id, x = target.x, y = target.y, goal_id = goal_id.as_deref().unwrap_or("-"), "goal assigned");
        Ok(goal_id)
    }

    /// # Errors
    ///
    /// Propagates the goal API failure.
    pub async fn go_home(&self, robot_id: &str) -> Result<Option<String>, MissionError> {
        self.assign_goal(HOME, robot_id).await
    }

    /// # Errors
    ///
    /// Propagates the goal API failure.
    pub async fn update_goal_status(&self, goal_id: &str, status: &str) -> Result<(), MissionError> {
        self.api.update_goal_status(goal_id, status).await?;
        Ok(())
    }

    /// Run the patrol preset to completion.
    ///
    /// # Errors
    ///
    /// See [`MissionCoordinator::run_sequence`].
    pub async fn run_patrol(&self, robot_id: &str) -> Result<MissionReport, MissionError> {
        self.run_sequence(&PATROL_ROUTE, robot_id, PATROL_DELAY).await
    }

    /// Run a user plan, [`WAYPOINT_DELAY`] apart unless told otherwise.
    ///
    /// # Errors
    ///
    /// See [`MissionCoordinator::run_sequence`].
    pub async fn run_plan(
        &self,
        plan: &WaypointPlan,
        robot_id: &str,
        delay: Option<Duration>,
    ) -> Result<MissionReport, MissionError> {
        if !plan.is_ready() {
            return Err(MissionError::TooFewPoints(plan.points().len()));
        }
        self.run_sequence(plan.points(), robot_id, delay.unwrap_or(WAYPOINT_DELAY)).await
    }

    /// Dispatch `points` in order, waiting `delay` between dispatches.
    ///
    /// # Errors
    ///
    /// Refused with [`MissionError::TooFewPoints`], [`MissionError::HardStop`]
    /// or [`MissionError::Busy`] before anything is sent. A dispatch failure
    /// ends the mission with [`MissionError::Goal`].
    pub async fn run_sequence(
        &self,
        points: &[Point],
        robot_id: &str,
        delay: Duration,
    ) -> Result<MissionReport, MissionError> {
        let id = self.begin(points, robot_id)?;
        self.drive(id, points, robot_id, delay).await
    }

    /// Validate and register a mission, then run it on a spawned task.
    ///
    /// # Errors
    ///
    /// Same refusals as [`MissionCoordinator::run_sequence`]; dispatch
    /// failures are logged by the task.
    pub fn start(
        self: &Arc<Self>,
        points: Vec<Point>,
        robot_id: String,
        delay: Duration,
    ) -> Result<Uuid, MissionError> {
        let id = self.begin(&points, &robot_id)?;
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.drive(id, &points, &robot_id, delay).await {
                warn!(mission = %id, error = %e, "mission failed");
            }
        });
        Ok(id)
    }

    /// Interrupt the running mission and ask the backend to cancel.
    pub async fn cancel(&self) {
        self.interrupt.send_replace(true);
        let robot_id = {
            let mut inner = self.lock();
            inner.pending_goal = None;
            inner.mission.as_mut().map(|m| {
                if !m.covered {
                    m.interrupted = true;
                }
                m.robot_id.clone()
            })
        };
        self.cancel_remote(robot_id.as_deref()).await;
    }

    /// Feed a reported robot position into coverage and marker tracking.
    ///
    /// Coverage only counts once every point has been dispatched.
    pub fn observe_position(&self, robot_id: &str, position: Point) {
        let mut inner = self.lock();
        if inner.pending_goal.is_some_and(|goal| goal.distance(position) < MARKER_TOLERANCE) {
            inner.pending_goal = None;
        }
        if let Some(m) = inner.mission.as_mut() {
            if m.robot_id == robot_id
                && !m.covered
                && !m.interrupted
                && m.dispatched == m.total
                && m.target.distance(position) < COVERAGE_TOLERANCE
            {
                m.covered = true;
                info!(mission = %m.id, robot_id, "mission target covered");
            }
        }
    }

    // --- Internals ---

    fn begin(&self, points: &[Point], robot_id: &str) -> Result<Uuid, MissionError> {
        let Some(&target) = points.last().filter(|_| points.len() >= MIN_WAYPOINTS) else {
            return Err(MissionError::TooFewPoints(points.len()));
        };
        if *self.hard_stop.borrow() {
            return Err(MissionError::HardStop);
        }

        let mut inner = self.lock();
        if inner.mission.as_ref().is_some_and(|m| m.active) {
            return Err(MissionError::Busy);
        }
        let id = Uuid::new_v4();
        inner.mission = Some(Mission {
            id,
            robot_id: robot_id.to_owned(),
            target,
            total: points.len(),
            dispatched: 0,
            active: true,
            covered: false,
            interrupted: false,
        });
        self.interrupt.send_replace(false);
        info!(mission = %id, robot_id, total = points.len(), "mission started");
        Ok(id)
    }

    async fn drive(
        &self,
        id: Uuid,
        points: &[Point],
        robot_id: &str,
        delay: Duration,
    ) -> Result<MissionReport, MissionError> {
        let mut interrupt = self.interrupt.subscribe();
        let mut hard_stop = self.hard_stop.clone();
        let mut outcome = Wait::Elapsed;

        for (index, point) in points.iter().enumerate() {
            if let Err(e) = self.api.add_goal(*point, robot_id).await {
                self.finish(id, false);
                return Err(e.into());
            }
            self.update(id, |m| m.dispatched += 1);

            if *hard_stop.borrow() {
                outcome = Wait::HardStop;
                break;
            }
            if *interrupt.borrow() {
                outcome = Wait::Interrupted;
                break;
            }
            if index + 1 == points.len() {
                break;
            }

            outcome = tokio::select! {
                () = raised(&mut interrupt) => Wait::Interrupted,
                () = raised(&mut hard_stop) => Wait::HardStop,
                () = tokio::time::sleep(delay) => Wait::Elapsed,
            };
            if !matches!(outcome, Wait::Elapsed) {
                break;
            }
        }

        let interrupted = !matches!(outcome, Wait::Elapsed);
        if matches!(outcome, Wait::HardStop) {
            warn!(mission = %id, "hard stop interrupted mission");
            self.cancel_remote(Some(robot_id)).await;
        }
        let report = self.finish(id, interrupted);
        info!(mission = %id, dispatched = report.dispatched, interrupted, "mission finished");
        Ok(report)
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut Mission)) {
        if let Some(m) = self.lock().mission.as_mut().filter(|m| m.id == id) {
            f(m);
        }
    }

    fn finish(&self, id: Uuid, interrupted: bool) -> MissionReport {
        let mut report = MissionReport { id, robot_id: String::new(), dispatched: 0, total: 0, interrupted };
        self.update(id, |m| {
            m.active = false;
            if interrupted {
                m.interrupted = true;
            }
            report.robot_id.clone_from(&m.robot_id);
            report.dispatched = m.dispatched;
            report.total = m.total;
            report.interrupted = m.interrupted;
        });
        report
    }

    async fn cancel_remote(&self, robot_id: Option<&str>) {
        if let Err(e) = self.api.cancel_goal(robot_id).await {
            warn!(error = %e, robot_id = robot_id.unwrap_or("*"), "goal cancel failed");
        }
    }
}
