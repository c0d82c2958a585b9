//! Health check handler.

use axum::Json;
use axum::extract::State;

use rollcall_database::DatabaseHealth;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = match &state.database {
        Some(db) => Some(db.probe().await),
        None => None,
    };
    let status = match database {
        Some(health) if health != DatabaseHealth::Ready => "degraded",
        _ => "ok",
    };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.config.attendance.store.to_string(),
        database: database
            .map_or("not_configured", |health| health.as_str())
            .to_string(),
    }))
}
