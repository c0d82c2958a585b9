//! Attendance session handlers (teacher side).

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::request::{MarkStatusRequest, OpenSessionRequest};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/attendance/sessions
pub async fn open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    let session = state
        .manager
        .open_session(
            req.class_id,
            req.date.unwrap_or_else(|| Utc::now().date_naive()),
            req.geofence.map(Into::into),
        )
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": session })))
}

/// GET /api/attendance/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.manager.get_session(id).await?;
    let rotating = state.scheduler.is_running(id);

    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "session": session, "rotating": rotating }
    })))
}

/// POST /api/attendance/sessions/{id}/close
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.manager.close_session(id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": session })))
}

/// GET /api/attendance/sessions/{id}/records
pub async fn list_records(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let records = state.manager.list_records(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "total": records.len(), "items": records }
    })))
}

/// PUT /api/attendance/sessions/{id}/records/{student_id}
pub async fn mark_status(
    State(state): State<AppState>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<MarkStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state
        .manager
        .mark_status(id, student_id, req.status)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": record })))
}
