//! PostgreSQL attendance store backed by the repositories in
//! `rollcall-database`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use rollcall_core::error::AppError;
use rollcall_database::repositories::{AttendanceRecordRepository, AttendanceSessionRepository};
use rollcall_entity::attendance::{
    AttendanceRecord, AttendanceSession, CreateAttendanceRecord, CreateAttendanceSession,
};

use super::{AttendanceStore, RecordInsert};

/// Attendance store over PostgreSQL.
///
/// Record uniqueness is delegated to the `(attendance_id, student_id)`
/// constraint via `ON CONFLICT DO NOTHING`.
#[derive(Debug, Clone)]
pub struct PgAttendanceStore {
    sessions: Arc<AttendanceSessionRepository>,
    records: Arc<AttendanceRecordRepository>,
}

impl PgAttendanceStore {
    /// Creates a new store from the session and record repositories.
    pub fn new(
        sessions: Arc<AttendanceSessionRepository>,
        records: Arc<AttendanceRecordRepository>,
    ) -> Self {
        Self { sessions, records }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn read_session(&self, id: Uuid) -> Result<Option<AttendanceSession>, AppError> {
        self.sessions.find_by_id(id).await
    }

    async fn update_active_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        if self.sessions.update_active_token(id, token).await? {
            return Ok(());
        }
        match self.sessions.find_by_id(id).await? {
            Some(_) => Err(AppError::conflict(format!(
                "Attendance session {} is closed",
                id
            ))),
            None => Err(AppError::not_found(format!(
                "Attendance session {} not found",
                id
            ))),
        }
    }

    async fn find_record(
        &self,
        attendance_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        self.records.find(attendance_id, student_id).await
    }

    async fn create_record(&self, data: &CreateAttendanceRecord) -> Result<RecordInsert, AppError> {
        Ok(match self.records.insert_if_absent(data).await? {
            Some(record) => RecordInsert::Inserted(record),
            None => RecordInsert::Conflict,
        })
    }

    async fn upsert_record(&self, data: &CreateAttendanceRecord) -> Result<AttendanceRecord, AppError> {
        self.records.upsert(data).await
    }

    async fn list_records(&self, attendance_id: Uuid) -> Result<Vec<AttendanceRecord>, AppError> {
        self.records.find_by_session(attendance_id).await
    }

    async fn create_session(
        &self,
        data: &CreateAttendanceSession,
    ) -> Result<AttendanceSession, AppError> {
        self.sessions.create(data).await
    }

    async fn close_session(&self, id: Uuid) -> Result<Option<AttendanceSession>, AppError> {
        self.sessions.close(id).await
    }
}
