//! Attendance session repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use rollcall_core::error::{AppError, ErrorKind};
use rollcall_core::result::AppResult;
use rollcall_entity::attendance::{AttendanceSession, CreateAttendanceSession};

/// Repository for attendance session rows.
#[derive(Debug, Clone)]
pub struct AttendanceSessionRepository {
    pool: PgPool,
}

impl AttendanceSessionRepository {
    /// Create a new attendance session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a session by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AttendanceSession>> {
        sqlx::query_as::<_, AttendanceSession>("SELECT * FROM attendance_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find attendance session", e)
            })
    }

    /// Insert a new open session.
    pub async fn create(&self, data: &CreateAttendanceSession) -> AppResult<AttendanceSession> {
        let fence = data.geofence.as_ref();
        sqlx::query_as::<_, AttendanceSession>(
            "INSERT INTO attendance_sessions \
                (id, class_id, date, is_open, location_latitude, location_longitude, radius_meters) \
             VALUES ($1, $2, $3, TRUE, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.class_id)
        .bind(data.date)
        .bind(fence.map(|f| f.center.latitude))
        .bind(fence.map(|f| f.center.longitude))
        .bind(fence.map(|f| f.radius_meters))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create attendance session", e)
        })
    }

    /// Overwrite the active token of an open session. Returns `false` when no
    /// open session matched.
    pub async fn update_active_token(&self, id: Uuid, token: Option<&str>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE attendance_sessions SET active_token = $2, updated_at = NOW() \
             WHERE id = $1 AND is_open",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update active token", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Close a session and clear its token. Returns the updated row, if any.
    pub async fn close(&self, id: Uuid) -> AppResult<Option<AttendanceSession>> {
        sqlx::query_as::<_, AttendanceSession>(
            "UPDATE attendance_sessions SET is_open = FALSE, active_token = NULL, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to close attendance session", e)
        })
    }
}
