//! Route definitions for the Rollcall HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and the request-logging middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(session_routes())
        .merge(rotation_routes())
        .merge(check_in_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Teacher-side session management.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/attendance/sessions",
            post(handlers::sessions::open_session),
        )
        .route(
            "/attendance/sessions/{id}",
            get(handlers::sessions::get_session),
        )
        .route(
            "/attendance/sessions/{id}/close",
            post(handlers::sessions::close_session),
        )
        .route(
            "/attendance/sessions/{id}/records",
            get(handlers::sessions::list_records),
        )
        .route(
            "/attendance/sessions/{id}/records/{student_id}",
            put(handlers::sessions::mark_status),
        )
}

/// Token rotation and display.
fn rotation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/attendance/sessions/{id}/rotation",
            post(handlers::rotation::start_rotation).delete(handlers::rotation::stop_rotation),
        )
        .route(
            "/attendance/sessions/{id}/rotation/refresh",
            post(handlers::rotation::refresh_rotation),
        )
        .route(
            "/attendance/sessions/{id}/display",
            get(handlers::rotation::display),
        )
        .route(
            "/attendance/sessions/{id}/display/stream",
            get(handlers::rotation::display_stream),
        )
}

fn check_in_routes() -> Router<AppState> {
    Router::new().route("/attendance/check-in", post(handlers::check_in::check_in))
}
