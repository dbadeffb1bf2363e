//! Backend goal REST client.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use async_trait::async_trait;
use canvas::camera::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum GoalError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("goal API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Operations the coordinator needs from the goal backend.
#[async_trait]
pub trait GoalApi: Send + Sync {
    /// Queue a goal for `robot_id`. Returns the backend's goal id when it reports one.
    async fn add_goal(&self, target: Point, robot_id: &str) -> Result<Option<String>, GoalError>;

    /// Cancel the current goal of `robot_id`, or of every robot when `None`.
    async fn cancel_goal(&self, robot_id: Option<&str>) -> Result<(), GoalError>;

    async fn update_goal_status(&self, goal_id: &str, status: &str) -> Result<(), GoalError>;
}

#[derive(Debug, Serialize)]
pub(crate) struct AddGoalBody<'a> {
    pub x: f64,
    pub y: f64,
    pub robot_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateGoalBody<'a> {
    pub id: &'a str,
    pub status: &'a str,
}

#[derive(Debug, Deserialize)]
struct AddGoalReply {
    goal_id: Option<String>,
}

pub struct HttpGoalApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGoalApi {
    /// # Errors
    ///
    /// Returns [`GoalError::HttpClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, GoalError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GoalError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<Value, GoalError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let value = response.json::<Value>().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(GoalError::Status { status: status.as_u16(), body: value.to_string() });
        }
        Ok(value)
    }
}

#[async_trait]
impl GoalApi for HttpGoalApi {
    async fn add_goal(&self, target: Point, robot_id: &str) -> Result<Option<String>, GoalError> {
        let reply = self.post("/goal/add", &AddGoalBody { x: target.x, y: target.y, robot_id }).await?;
        Ok(serde_json::from_value::<AddGoalReply>(reply).ok().and_then(|r| r.goal_id))
    }

    async fn cancel_goal(&self, robot_id: Option<&str>) -> Result<(), GoalError> {
        let body = robot_id.map_or_else(|| serde_json::json!({}), |id| serde_json::json!({ "robot_id": id }));
        self.post("/goal/cancel", &body).await?;
        Ok(())
    }

    async fn update_goal_status(&self, goal_id: &str, status: &str) -> Result<(), GoalError> {
        self.post("/goal/update", &UpdateGoalBody { id: goal_id, status }).await?;
        Ok(())
    }
}
