//! Session lifecycle and teacher-side record management.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use rollcall_core::error::AppError;
use rollcall_entity::attendance::{
    AttendanceRecord, AttendanceSession, AttendanceStatus, CreateAttendanceRecord,
    CreateAttendanceSession,
};
use rollcall_entity::geo::Geofence;

use crate::generator::RotationScheduler;
use crate::store::AttendanceStore;

/// Opens and closes attendance sessions and manages their records.
#[derive(Debug, Clone)]
pub struct AttendanceManager {
    store: Arc<dyn AttendanceStore>,
    scheduler: Arc<RotationScheduler>,
}

impl AttendanceManager {
    /// Creates a new manager.
    pub fn new(store: Arc<dyn AttendanceStore>, scheduler: Arc<RotationScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Open a session for a class on a date, optionally fenced.
    pub async fn open_session(
        &self,
        class_id: Uuid,
        date: NaiveDate,
        geofence: Option<Geofence>,
    ) -> Result<AttendanceSession, AppError> {
        if let Some(fence) = &geofence {
            validate_geofence(fence)?;
        }

        let session = self
            .store
            .create_session(&CreateAttendanceSession {
                class_id,
                date,
                geofence,
            })
            .await?;

        info!(
            session_id = %session.id,
            class_id = %class_id,
            date = %date,
            fenced = session.geofence().is_some(),
            "Attendance session opened"
        );
        Ok(session)
    }

    /// Load a session.
    pub async fn get_session(&self, id: Uuid) -> Result<AttendanceSession, AppError> {
        self.store
            .read_session(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attendance session {} not found", id)))
    }

    /// Close a session: stop its rotation, reject further check-ins, and
    /// clear its active token.
    pub async fn close_session(&self, id: Uuid) -> Result<AttendanceSession, AppError> {
        self.scheduler.stop(id);

        let session = self
            .store
            .close_session(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attendance session {} not found", id)))?;

        info!(session_id = %id, "Attendance session closed");
        Ok(session)
    }

    /// Set a student's status directly, bypassing token checks.
    ///
    /// Allowed on closed sessions so attendance can be corrected afterwards.
    pub async fn mark_status(
        &self,
        id: Uuid,
        student_id: Uuid,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        self.get_session(id).await?;

        let record = self
            .store
            .upsert_record(&CreateAttendanceRecord {
                attendance_id: id,
                student_id,
                status,
                recorded_at: Utc::now(),
            })
            .await?;

        info!(
            session_id = %id,
            student_id = %student_id,
            status = %status,
            "Attendance status set"
        );
        Ok(record)
    }

    /// All records of a session.
    pub async fn list_records(&self, id: Uuid) -> Result<Vec<AttendanceRecord>, AppError> {
        self.get_session(id).await?;
        self.store.list_records(id).await
    }
}

fn validate_geofence(fence: &Geofence) -> Result<(), AppError> {
    if !fence.center.is_valid() {
        return Err(AppError::validation(
            "Geofence center must be a valid latitude/longitude",
        ));
    }
    if !fence.radius_meters.is_finite() || fence.radius_meters <= 0.0 {
        return Err(AppError::validation(
            "Geofence radius must be a positive number of meters",
        ));
    }
    Ok(())
}
