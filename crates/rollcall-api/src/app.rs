//! Application builder: wires router, middleware, and state into an Axum
//! app, and runs the server.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use rollcall_attendance::{AttendanceStore, MemoryAttendanceStore, PgAttendanceStore};
use rollcall_core::config::{AppConfig, ServerConfig, StoreBackend};
use rollcall_core::error::AppError;
use rollcall_database::AttendanceDatabase;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    build_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(build_cors_layer(&server.cors))
        .layer(TraceLayer::new_for_http())
}

/// Runs the Rollcall server until Ctrl+C / SIGTERM.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    // ── Step 1: Attendance store ─────────────────────────────────
    info!("Initializing attendance store (backend: {})...", config.attendance.store);
    let (store, database) = init_store(&config).await?;

    // ── Step 2: Attendance services ──────────────────────────────
    let state = AppState::new(config.clone(), store, database.clone());
    let scheduler = Arc::clone(&state.scheduler);

    // ── Step 3: Build and start HTTP server ──────────────────────
    let app = build_app(state, &config.server);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Rollcall server listening on {}", addr);

    let (signalled_tx, mut signalled_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping token rotation...");
            // Ending every rotation also ends the open display streams.
            scheduler.shutdown();
            let _ = signalled_tx.send(true);
        })
        .into_future();

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {}", e)))?;
        }
        _ = async {
            if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out; dropping open connections");
        }
    }

    // ── Step 4: Release resources ────────────────────────────────
    if let Some(db) = database {
        db.close().await;
    }
    info!("Rollcall server stopped");

    Ok(())
}

async fn init_store(
    config: &AppConfig,
) -> Result<(Arc<dyn AttendanceStore>, Option<AttendanceDatabase>), AppError> {
    match config.attendance.store {
        StoreBackend::Postgres => {
            let db = AttendanceDatabase::open(&config.database).await?;
            let store: Arc<dyn AttendanceStore> =
                Arc::new(PgAttendanceStore::new(db.sessions(), db.records()));
            Ok((store, Some(db)))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory attendance store; sessions and records are lost on restart");
            let store: Arc<dyn AttendanceStore> = Arc::new(MemoryAttendanceStore::new());
            Ok((store, None))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
