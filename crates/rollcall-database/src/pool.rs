//! The attendance database: pool, schema migrations and repositories.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use rollcall_core::config::DatabaseConfig;
use rollcall_core::error::{AppError, ErrorKind};

use crate::repositories::{AttendanceRecordRepository, AttendanceSessionRepository};

/// Postgres error code for a missing relation.
const UNDEFINED_TABLE: &str = "42P01";

/// Result of probing the attendance tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseHealth {
    /// The sessions table answers queries.
    Ready,
    /// Connected, but the attendance schema has not been migrated.
    SchemaMissing,
    /// The query failed for any other reason.
    Unreachable,
}

impl DatabaseHealth {
    /// Label reported by the health endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "connected",
            Self::SchemaMissing => "schema_missing",
            Self::Unreachable => "unreachable",
        }
    }
}

/// Connected attendance database with its session and record repositories.
#[derive(Debug, Clone)]
pub struct AttendanceDatabase {
    pool: PgPool,
    sessions: Arc<AttendanceSessionRepository>,
    records: Arc<AttendanceRecordRepository>,
}

impl AttendanceDatabase {
    /// Connect, apply pending migrations when enabled, and build the
    /// repositories.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            endpoint = %endpoint(&config.url),
            max_connections = config.max_connections,
            "Opening attendance database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Attendance database at {} is unavailable", endpoint(&config.url)),
                    e,
                )
            })?;

        if config.run_migrations {
            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Attendance schema migration failed", e)
                })?;
            info!("Attendance schema is up to date");
        } else {
            warn!("Skipping migrations; the attendance schema must already exist");
        }

        Ok(Self {
            sessions: Arc::new(AttendanceSessionRepository::new(pool.clone())),
            records: Arc::new(AttendanceRecordRepository::new(pool.clone())),
            pool,
        })
    }

    /// Session repository.
    pub fn sessions(&self) -> Arc<AttendanceSessionRepository> {
        Arc::clone(&self.sessions)
    }

    /// Record repository.
    pub fn records(&self) -> Arc<AttendanceRecordRepository> {
        Arc::clone(&self.records)
    }

    /// Probe the sessions table rather than the bare connection, so an
    /// unmigrated database is reported as such.
    pub async fn probe(&self) -> DatabaseHealth {
        let result = sqlx::query_scalar::<_, i32>("SELECT 1 FROM attendance_sessions LIMIT 1")
            .fetch_optional(&self.pool)
            .await;
        match result {
            Ok(_) => DatabaseHealth::Ready,
            Err(e) if is_undefined_table(&e) => DatabaseHealth::SchemaMissing,
            Err(e) => {
                warn!(error = %e, "Attendance database probe failed");
                DatabaseHealth::Unreachable
            }
        }
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Attendance database closed");
    }
}

fn is_undefined_table(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNDEFINED_TABLE)
}

/// Host, port and database name of a connection URL. Credentials and query
/// parameters (which may carry `password=`) are left out.
fn endpoint(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
    rest.split(['?', '#']).next().unwrap_or(rest)
}
