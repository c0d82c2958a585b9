//! Attendance session store contract.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAttendanceStore;
pub use postgres::PgAttendanceStore;

use async_trait::async_trait;
use uuid::Uuid;

use rollcall_core::error::AppError;
use rollcall_entity::attendance::{
    AttendanceRecord, AttendanceSession, CreateAttendanceRecord, CreateAttendanceSession,
};

/// Outcome of inserting a record under the `(attendance_id, student_id)`
/// uniqueness constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordInsert {
    /// The record was written.
    Inserted(AttendanceRecord),
    /// A record for this student and session already exists.
    Conflict,
}

/// Persistence for attendance sessions and records.
///
/// Implementations must be thread-safe. `create_record` must be atomic with
/// respect to the uniqueness constraint: of two concurrent inserts for the
/// same student and session, exactly one returns `Inserted`.
#[async_trait]
pub trait AttendanceStore: Send + Sync + std::fmt::Debug {
    /// Load a session by id.
    async fn read_session(&self, id: Uuid) -> Result<Option<AttendanceSession>, AppError>;

    /// Overwrite a session's active token. Fails with `NotFound` when the
    /// session does not exist and `Conflict` when it is closed; the open check
    /// and the write must be atomic, so a close always wins over a late write.
    async fn update_active_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError>;

    /// Find the record for a student in a session.
    async fn find_record(
        &self,
        attendance_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    /// Insert a record unless one already exists for the student.
    async fn create_record(&self, data: &CreateAttendanceRecord) -> Result<RecordInsert, AppError>;

    /// Insert or overwrite the record for a student.
    async fn upsert_record(&self, data: &CreateAttendanceRecord) -> Result<AttendanceRecord, AppError>;

    /// All records of a session, oldest first.
    async fn list_records(&self, attendance_id: Uuid) -> Result<Vec<AttendanceRecord>, AppError>;

    /// Open a new session.
    async fn create_session(
        &self,
        data: &CreateAttendanceSession,
    ) -> Result<AttendanceSession, AppError>;

    /// Close a session and clear its active token. Returns `None` when the
    /// session does not exist.
    async fn close_session(&self, id: Uuid) -> Result<Option<AttendanceSession>, AppError>;
}
