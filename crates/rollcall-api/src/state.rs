//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use rollcall_attendance::{AttendanceManager, AttendanceStore, RotationScheduler, Verifier};
use rollcall_core::config::AppConfig;
use rollcall_database::AttendanceDatabase;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Attendance database; absent when running on the memory store
    pub database: Option<AttendanceDatabase>,
    /// Session and record store
    pub store: Arc<dyn AttendanceStore>,
    /// Per-session token rotation
    pub scheduler: Arc<RotationScheduler>,
    /// Check-in verification
    pub verifier: Arc<Verifier>,
    /// Session lifecycle and record management
    pub manager: Arc<AttendanceManager>,
}

impl AppState {
    /// Wires the attendance services around `store`.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn AttendanceStore>,
        database: Option<AttendanceDatabase>,
    ) -> Self {
        let scheduler = Arc::new(RotationScheduler::new(
            Arc::clone(&store),
            &config.attendance,
        ));
        let verifier = Arc::new(Verifier::from_config(
            Arc::clone(&store),
            &config.attendance,
        ));
        let manager = Arc::new(AttendanceManager::new(
            Arc::clone(&store),
            Arc::clone(&scheduler),
        ));

        Self {
            config: Arc::new(config),
            database,
            store,
            scheduler,
            verifier,
            manager,
        }
    }
}
