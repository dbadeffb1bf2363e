//! Feed lifecycle commands.
//!
//! Both answer with the connectivity view. Connecting restarts every feed
//! with a fresh retry budget; it is refused while the hard stop is engaged.

#[cfg(test)]
#[path = "streams_test.rs"]
mod streams_test;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use super::views::ConnectionView;
use crate::state::AppState;

/// `POST /api/stream/connect` — (re)connect the backend and relay feeds.
pub async fn connect(State(state): State<AppState>) -> Result<Json<ConnectionView>, StatusCode> {
    if state.estop.is_engaged() {
        return Err(StatusCode::LOCKED);
    }
    state.feeds.connect();
    Ok(Json(ConnectionView::of(&state)))
}

/// `POST /api/stream/disconnect` — close every feed and cancel pending reconnects.
pub async fn disconnect(State(state): State<AppState>) -> Json<ConnectionView> {
    state.feeds.disconnect();
    Json(ConnectionView::of(&state))
}
