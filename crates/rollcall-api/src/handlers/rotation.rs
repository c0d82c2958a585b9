//! Token rotation and display handlers.
//!
//! The display endpoints are a read-only view of the rotating token. They are
//! not a security boundary: a token is only ever accepted by the verifier.

use std::convert::Infallible;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use uuid::Uuid;

use rollcall_attendance::DisplayFeed;
use rollcall_core::error::AppError;

use crate::dto::response::{ApiResponse, RotationResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/attendance/sessions/{id}/rotation
pub async fn start_rotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RotationResponse>>, ApiError> {
    let mut feed = state.scheduler.start(id).await?;
    let display = feed.current().await;

    Ok(Json(ApiResponse::ok(RotationResponse {
        session_id: id,
        running: state.scheduler.is_running(id),
        display,
    })))
}

/// DELETE /api/attendance/sessions/{id}/rotation
pub async fn stop_rotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RotationResponse>>, ApiError> {
    if !state.scheduler.stop(id) {
        return Err(rotation_not_running(id).into());
    }

    Ok(Json(ApiResponse::ok(RotationResponse {
        session_id: id,
        running: false,
        display: None,
    })))
}

/// POST /api/attendance/sessions/{id}/rotation/refresh
pub async fn refresh_rotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RotationResponse>>, ApiError> {
    let mut feed = running_feed(&state, id)?;
    let previous = feed.snapshot().map(|d| d.token);

    if !state.scheduler.refresh(id) {
        return Err(rotation_not_running(id).into());
    }

    // Wait for the forced rotation so the caller sees the new token.
    let mut display = feed.snapshot();
    while display.as_ref().map(|d| &d.token) == previous.as_ref() {
        if feed.changed().await.is_err() {
            display = None;
            break;
        }
        display = feed.snapshot();
    }

    Ok(Json(ApiResponse::ok(RotationResponse {
        session_id: id,
        running: state.scheduler.is_running(id),
        display,
    })))
}

/// GET /api/attendance/sessions/{id}/display
pub async fn display(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut feed = running_feed(&state, id)?;
    let display = feed
        .current()
        .await
        .ok_or_else(|| rotation_not_running(id))?;

    Ok(Json(serde_json::json!({ "success": true, "data": display })))
}

/// GET /api/attendance/sessions/{id}/display/stream
///
/// Emits a `token` event with the current display on connect and on every
/// token or countdown change. The stream ends when rotation stops.
pub async fn display_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let feed = running_feed(&state, id)?;
    Ok(Sse::new(display_events(feed)).keep_alive(KeepAlive::default()))
}

fn display_events(feed: DisplayFeed) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((feed, true), |(mut feed, first)| async move {
        if !first {
            feed.changed().await.ok()?;
        }
        let display = feed.current().await?;
        let event = Event::default()
            .event("token")
            .id(display.issued_at.timestamp_millis().to_string())
            .json_data(&display)
            .ok()?;
        Some((Ok(event), (feed, false)))
    })
}

fn running_feed(state: &AppState, id: Uuid) -> Result<DisplayFeed, AppError> {
    state
        .scheduler
        .feed(id)
        .ok_or_else(|| rotation_not_running(id))
}

fn rotation_not_running(id: Uuid) -> AppError {
    AppError::not_found(format!("Token rotation is not running for session {}", id))
}
