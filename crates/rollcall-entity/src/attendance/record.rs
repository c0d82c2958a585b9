//! Attendance record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::AttendanceStatus;

/// A single student's outcome for one attendance session.
///
/// At most one record exists per `(attendance_id, student_id)`; the storage
/// layer enforces this with a uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// The attendance session.
    pub attendance_id: Uuid,
    /// The student the record is for.
    pub student_id: Uuid,
    /// Recorded outcome.
    pub status: AttendanceStatus,
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Data required to insert an attendance record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceRecord {
    /// The attendance session.
    pub attendance_id: Uuid,
    /// The student.
    pub student_id: Uuid,
    /// Outcome to record.
    pub status: AttendanceStatus,
    /// Timestamp to record.
    pub recorded_at: DateTime<Utc>,
}
