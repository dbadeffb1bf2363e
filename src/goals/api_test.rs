use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use super::*;

type Recorded = Arc<Mutex<Vec<(String, Value)>>>;

/// Minimal stand-in for the goal backend. `/goal/update` always answers 404.
async fn spawn_backend() -> (String, Recorded) {
    let recorded: Recorded = Arc::default();

    async fn add(State(log): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
        log.lock().unwrap().push(("add".into(), body));
        Json(json!({"status": "success", "goal_id": "goal_ab12"}))
    }
    async fn cancel(State(log): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
        log.lock().unwrap().push(("cancel".into(), body));
        Json(json!({"status": "success"}))
    }
    async fn update(State(log): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        log.lock().unwrap().push(("update".into(), body));
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Goal not found"})))
    }

    let app = Router::new()
        .route("/goal/add", post(add))
        .route("/goal/cancel", post(cancel))
        .route("/goal/update", post(update))
        .with_state(Arc::clone(&recorded));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), recorded)
}

#[test]
fn add_goal_body_shape() {
    let body = AddGoalBody { x: 120.0, y: 80.5, robot_id: "robot_001" };
    assert_eq!(serde_json::to_value(&body).unwrap(), json!({"x": 120.0, "y": 80.5, "robot_id": "robot_001"}));
}

#[test]
fn update_goal_body_shape() {
    let body = UpdateGoalBody { id: "goal_1", status: "completed" };
    assert_eq!(serde_json::to_value(&body).unwrap(), json!({"id": "goal_1", "status": "completed"}));
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let api = HttpGoalApi::new("http://backend:8000/").unwrap();
    assert_eq!(api.url("/goal/add"), "http://backend:8000/goal/add");
}

#[tokio::test]
async fn add_goal_posts_target_and_returns_id() {
    let (base, recorded) = spawn_backend().await;
    let api = HttpGoalApi::new(&base).unwrap();

    let id = api.add_goal(Point::new(400.0, 300.0), "robot_002").await.unwrap();

    assert_eq!(id.as_deref(), Some("goal_ab12"));
    let log = recorded.lock().unwrap();
    assert_eq!(log.as_slice(), [("add".to_owned(), json!({"x": 400.0, "y": 300.0, "robot_id": "robot_002"}))]);
}

#[tokio::test]
async fn cancel_goal_scopes_to_robot_when_given() {
    let (base, recorded) = spawn_backend().await;
    let api = HttpGoalApi::new(&base).unwrap();

    api.cancel_goal(Some("robot_001")).await.unwrap();
    api.cancel_goal(None).await.unwrap();

    let log = recorded.lock().unwrap();
    assert_eq!(log[0].1, json!({"robot_id": "robot_001"}));
    assert_eq!(log[1].1, json!({}));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (base, _recorded) = spawn_backend().await;
    let api = HttpGoalApi::new(&base).unwrap();

    let err = api.update_goal_status("goal_missing", "completed").await.unwrap_err();
    match err {
        GoalError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Goal not found"));
        }
        other => panic!("expected status error, got {other}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_http_error() {
    let api = HttpGoalApi::new("http://127.0.0.1:1").unwrap();
    let err = api.add_goal(Point::new(0.0, 0.0), "robot_001").await.unwrap_err();
    assert!(matches!(err, GoalError::Http(_)));
}
