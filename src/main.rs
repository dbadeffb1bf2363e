//! Fleet operations core.
//!
//! `serve` runs the live side: stream clients feed the ingest task, which
//! merges telemetry and drives mission coverage, and an HTTP surface exposes
//! the merged state and mission commands. The other subcommands run one goal
//! or mission against the backend and exit.

mod config;
mod goals;
mod routes;
mod services;
mod state;
mod stream;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use canvas::camera::Point;
use canvas::doc::{TrailIoError, TrailStore};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use telemetry::TelemetryStore;
use telemetry::simulate::Simulator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::FleetConfig;
use goals::mission::WAYPOINT_DELAY;
use goals::{GoalApi, GoalError, HttpGoalApi, MissionCoordinator, MissionError, MissionReport, WaypointPlan};
use state::{AppState, EStop};
use stream::transport::{Connector, WsConnector};
use stream::feeds::{Feed, Feeds};
use stream::{ReconnectingClient, STATUS_REQUEST, StreamOptions};

/// Decoded messages buffered between the stream clients and the ingest task.
const INGEST_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("trail file is invalid: {0}")]
    Trail(#[from] TrailIoError),
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "fleetops", about = "Fleet telemetry sync and goal missions")]
struct Cli {
    #[arg(long, env = "FLEET_API_URL", default_value = "http://127.0.0.1:8000")]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the stream clients, ingest task and HTTP surface.
    Serve(ServeArgs),
    /// Send one goal.
    Goal {
        x: f64,
        y: f64,
        #[arg(long)]
        robot_id: Option<String>,
    },
    /// Send the robot to the map centre.
    Home {
        #[arg(long)]
        robot_id: Option<String>,
    },
    /// Run the patrol route.
    Patrol {
        #[arg(long)]
        robot_id: Option<String>,
    },
    /// Run a waypoint mission given as `x,y` pairs.
    Waypoints {
        #[arg(required = true, num_args = 2..=10, value_parser = parse_point)]
        points: Vec<Point>,
        #[arg(long)]
        robot_id: Option<String>,
        #[arg(long, default_value_t = duration_ms(WAYPOINT_DELAY))]
        delay_ms: u64,
    },
    /// Run the points of an exported trail file as a waypoint mission.
    RunTrail {
        file: PathBuf,
        #[arg(long)]
        robot_id: Option<String>,
        #[arg(long, default_value_t = duration_ms(WAYPOINT_DELAY))]
        delay_ms: u64,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    #[arg(long, env = "FLEET_WS_URL", default_value = "ws://127.0.0.1:8000/ws")]
    ws_url: String,

    /// Topic relay feed; disabled when unset.
    #[arg(long, env = "FLEET_RELAY_URL")]
    relay_url: Option<String>,

    /// Feed the store from the random-walk simulator.
    #[arg(long, env = "FLEET_SIMULATE", default_value_t = false)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring .env: {e}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = FleetConfig::from_env();
    let api: Arc<dyn GoalApi> = Arc::new(HttpGoalApi::new(&cli.api_url)?);

    match cli.command {
        Command::Serve(args) => serve(args, &config, api).await,
        Command::Goal { x, y, robot_id } => {
            let missions = standalone(api);
            let robot_id = robot_or_default(robot_id, &config);
            let goal_id = missions.assign_goal(Point::new(x, y), &robot_id).await?;
            print_json(&serde_json::json!({ "goal_id": goal_id, "robot_id": robot_id }))
        }
        Command::Home { robot_id } => {
            let missions = standalone(api);
            let robot_id = robot_or_default(robot_id, &config);
            let goal_id = missions.go_home(&robot_id).await?;
            print_json(&serde_json::json!({ "goal_id": goal_id, "robot_id": robot_id }))
        }
        Command::Patrol { robot_id } => {
            let missions = standalone(api);
            let robot_id = robot_or_default(robot_id, &config);
            let watcher = cancel_on_ctrl_c(&missions);
            let result = missions.run_patrol(&robot_id).await;
            watcher.abort();
            print_report(&missions, result?)
        }
        Command::Waypoints { points, robot_id, delay_ms } => {
            let plan = WaypointPlan::from_points(points)?;
            let missions = standalone(api);
            let robot_id = robot_or_default(robot_id, &config);
            let watcher = cancel_on_ctrl_c(&missions);
            let result = missions.run_plan(&plan, &robot_id, Some(Duration::from_millis(delay_ms))).await;
            watcher.abort();
            print_report(&missions, result?)
        }
        Command::RunTrail { file, robot_id, delay_ms } => {
            let raw = std::fs::read_to_string(&file).map_err(|source| CliError::Read { path: file.clone(), source })?;
            let points = TrailStore::import_json(&raw)?.waypoints();
            info!(path = %file.display(), points = points.len(), "trail loaded");
            run_mission(api, points, robot_or_default(robot_id, &config), Duration::from_millis(delay_ms)).await
        }
    }
}

// =============================================================================
// SERVE
// =============================================================================

async fn serve(args: ServeArgs, config: &FleetConfig, api: Arc<dyn GoalApi>) -> Result<(), CliError> {
    let plan = WaypointPlan::new(config.plan_capacity)?;
    let estop = EStop::new();
    let connector: Arc<dyn Connector> = Arc::new(WsConnector);
    let (tx, rx) = mpsc::channel(INGEST_QUEUE_CAPACITY);

    let backend = ReconnectingClient::new(
        Arc::clone(&connector),
        StreamOptions { name: "backend", hello: Some(STATUS_REQUEST.to_owned()), policy: config.reconnect },
        estop.subscribe(),
    );
    let relay = args.relay_url.as_ref().map(|url| {
        let client = ReconnectingClient::new(
            Arc::clone(&connector),
            StreamOptions { name: "relay", hello: None, policy: config.reconnect },
            estop.subscribe(),
        );
        Feed::new(client, url.clone())
    });
    let feeds = Feeds::new(Feed::new(backend, args.ws_url.clone()), relay, tx);

    let store = TelemetryStore::new(config.default_robot.clone(), config.trend_len);
    let state = AppState::new(store, api, estop, feeds, plan);

    let ingest = services::ingest::spawn_ingest_task(state.clone(), rx);
    let simulator = args.simulate.then(|| {
        services::simulate::spawn_simulator_task(state.clone(), Simulator::from_os_rng(), config.simulate_interval)
    });
    state.feeds.connect();

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .map_err(|source| CliError::Bind { port: args.port, source })?;
    info!(
        port = args.port,
        ws_url = state.feeds.backend().url(),
        relay = state.feeds.relay().is_some(),
        "fleetops listening"
    );

    let feeds = Arc::clone(&state.feeds);
    let missions = Arc::clone(&state.missions);
    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(shutdown_signal(missions))
        .await
        .map_err(CliError::Serve)?;

    feeds.disconnect();
    if let Some(handle) = simulator {
        handle.abort();
    }
    ingest.abort();
    Ok(())
}

async fn shutdown_signal(missions: Arc<MissionCoordinator>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
    missions.cancel().await;
}

// =============================================================================
// ONE-SHOT COMMANDS
// =============================================================================

/// Coordinator for a single CLI command. No e-stop source is wired in.
fn standalone(api: Arc<dyn GoalApi>) -> Arc<MissionCoordinator> {
    Arc::new(MissionCoordinator::new(api, EStop::new().subscribe()))
}

/// Run a mission to completion; Ctrl-C interrupts it and cancels the goal.
async fn run_mission(
    api: Arc<dyn GoalApi>,
    points: Vec<Point>,
    robot_id: String,
    delay: Duration,
) -> Result<(), CliError> {
    let missions = standalone(api);
    let watcher = cancel_on_ctrl_c(&missions);
    let result = missions.run_sequence(&points, &robot_id, delay).await;
    watcher.abort();
    print_report(&missions, result?)
}

fn cancel_on_ctrl_c(missions: &Arc<MissionCoordinator>) -> JoinHandle<()> {
    let missions = Arc::clone(missions);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling mission");
            missions.cancel().await;
        }
    })
}

fn print_report(missions: &MissionCoordinator, report: MissionReport) -> Result<(), CliError> {
    print_json(&serde_json::json!({ "report": report, "status": missions.status() }))
}

fn robot_or_default(robot_id: Option<String>, config: &FleetConfig) -> String {
    robot_id.filter(|id| !id.trim().is_empty()).unwrap_or_else(|| config.default_robot.clone())
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw.split_once(',').ok_or_else(|| format!("expected x,y, got {raw:?}"))?;
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}"));
    Ok(Point::new(parse(x)?, parse(y)?))
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
