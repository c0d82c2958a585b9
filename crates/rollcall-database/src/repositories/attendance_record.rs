//! Attendance record repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use rollcall_core::error::{AppError, ErrorKind};
use rollcall_core::result::AppResult;
use rollcall_entity::attendance::{AttendanceRecord, CreateAttendanceRecord};

/// Repository for attendance record rows.
#[derive(Debug, Clone)]
pub struct AttendanceRecordRepository {
    pool: PgPool,
}

impl AttendanceRecordRepository {
    /// Create a new attendance record repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the record for a student in a session.
    pub async fn find(
        &self,
        attendance_id: Uuid,
        student_id: Uuid,
    ) -> AppResult<Option<AttendanceRecord>> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE attendance_id = $1 AND student_id = $2",
        )
        .bind(attendance_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find attendance record", e)
        })
    }

    /// Insert a record unless one already exists for the pair.
    ///
    /// Returns `None` when the uniqueness constraint rejected the row.
    pub async fn insert_if_absent(
        &self,
        data: &CreateAttendanceRecord,
    ) -> AppResult<Option<AttendanceRecord>> {
        sqlx::query_as::<_, AttendanceRecord>(
            "INSERT INTO attendance_records (id, attendance_id, student_id, status, recorded_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (attendance_id, student_id) DO NOTHING \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.attendance_id)
        .bind(data.student_id)
        .bind(data.status)
        .bind(data.recorded_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert attendance record", e)
        })
    }

    /// Insert or overwrite the status for a pair.
    pub async fn upsert(&self, data: &CreateAttendanceRecord) -> AppResult<AttendanceRecord> {
        sqlx::query_as::<_, AttendanceRecord>(
            "INSERT INTO attendance_records (id, attendance_id, student_id, status, recorded_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (attendance_id, student_id) DO UPDATE SET \
                status = EXCLUDED.status, \
                recorded_at = EXCLUDED.recorded_at \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.attendance_id)
        .bind(data.student_id)
        .bind(data.status)
        .bind(data.recorded_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to upsert attendance record", e)
        })
    }

    /// List every record for a session, oldest first.
    pub async fn find_by_session(&self, attendance_id: Uuid) -> AppResult<Vec<AttendanceRecord>> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE attendance_id = $1 ORDER BY recorded_at ASC",
        )
        .bind(attendance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list attendance records", e)
        })
    }
}
