//! In-memory attendance store using a Tokio mutex for single-node deployments
//! and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use rollcall_core::error::AppError;
use rollcall_entity::attendance::{
    AttendanceRecord, AttendanceSession, CreateAttendanceRecord, CreateAttendanceSession,
};

use super::{AttendanceStore, RecordInsert};

#[derive(Debug, Default)]
struct InnerState {
    sessions: HashMap<Uuid, AttendanceSession>,
    /// Keyed by `(attendance_id, student_id)`.
    records: HashMap<(Uuid, Uuid), AttendanceRecord>,
}

/// In-memory attendance store.
///
/// Record inserts check and write under one lock, which gives the same
/// uniqueness guarantee as the database constraint.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttendanceStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryAttendanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a session as-is.
    pub async fn put_session(&self, session: AttendanceSession) {
        let mut state = self.state.lock().await;
        state.sessions.insert(session.id, session);
    }

    /// Number of records across all sessions.
    pub async fn record_count(&self) -> usize {
        self.state.lock().await.records.len()
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn read_session(&self, id: Uuid) -> Result<Option<AttendanceSession>, AppError> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(&id).cloned())
    }

    async fn update_active_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Attendance session {} not found", id)))?;
        if !session.is_open {
            return Err(AppError::conflict(format!(
                "Attendance session {} is closed",
                id
            )));
        }
        session.active_token = token.map(str::to_string);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn find_record(
        &self,
        attendance_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let state = self.state.lock().await;
        Ok(state.records.get(&(attendance_id, student_id)).cloned())
    }

    async fn create_record(&self, data: &CreateAttendanceRecord) -> Result<RecordInsert, AppError> {
        let mut state = self.state.lock().await;
        let key = (data.attendance_id, data.student_id);
        if state.records.contains_key(&key) {
            return Ok(RecordInsert::Conflict);
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            attendance_id: data.attendance_id,
            student_id: data.student_id,
            status: data.status,
            recorded_at: data.recorded_at,
        };
        state.records.insert(key, record.clone());
        Ok(RecordInsert::Inserted(record))
    }

    async fn upsert_record(&self, data: &CreateAttendanceRecord) -> Result<AttendanceRecord, AppError> {
        let mut state = self.state.lock().await;
        let key = (data.attendance_id, data.student_id);
        let record = state
            .records
            .entry(key)
            .and_modify(|r| {
                r.status = data.status;
                r.recorded_at = data.recorded_at;
            })
            .or_insert_with(|| AttendanceRecord {
                id: Uuid::new_v4(),
                attendance_id: data.attendance_id,
                student_id: data.student_id,
                status: data.status,
                recorded_at: data.recorded_at,
            });
        Ok(record.clone())
    }

    async fn list_records(&self, attendance_id: Uuid) -> Result<Vec<AttendanceRecord>, AppError> {
        let state = self.state.lock().await;
        let mut records: Vec<AttendanceRecord> = state
            .records
            .values()
            .filter(|r| r.attendance_id == attendance_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.recorded_at);
        Ok(records)
    }

    async fn create_session(
        &self,
        data: &CreateAttendanceSession,
    ) -> Result<AttendanceSession, AppError> {
        let now = Utc::now();
        let (location_latitude, location_longitude, radius_meters) = match data.geofence {
            Some(fence) => (
                Some(fence.center.latitude),
                Some(fence.center.longitude),
                Some(fence.radius_meters),
            ),
            None => (None, None, None),
        };
        let session = AttendanceSession {
            id: Uuid::new_v4(),
            class_id: data.class_id,
            date: data.date,
            is_open: true,
            active_token: None,
            location_latitude,
            location_longitude,
            radius_meters,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().await;
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn close_session(&self, id: Uuid) -> Result<Option<AttendanceSession>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state.sessions.get_mut(&id).map(|session| {
            session.is_open = false;
            session.active_token = None;
            session.updated_at = Utc::now();
            session.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_entity::attendance::AttendanceStatus;

    fn new_record(attendance_id: Uuid, student_id: Uuid) -> CreateAttendanceRecord {
        CreateAttendanceRecord {
            attendance_id,
            student_id,
            status: AttendanceStatus::Present,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_second_insert_conflicts() {
        let store = MemoryAttendanceStore::new();
        let (session, student) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.create_record(&new_record(session, student)).await.unwrap();
        assert!(matches!(first, RecordInsert::Inserted(_)));

        let second = store.create_record(&new_record(session, student)).await.unwrap();
        assert_eq!(second, RecordInsert::Conflict);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_yield_one_record() {
        let store = MemoryAttendanceStore::new();
        let (session, student) = (Uuid::new_v4(), Uuid::new_v4());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_record(&new_record(session, student)).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), RecordInsert::Inserted(_)) {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_status() {
        let store = MemoryAttendanceStore::new();
        let (session, student) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.upsert_record(&new_record(session, student)).await.unwrap();
        let mut excused = new_record(session, student);
        excused.status = AttendanceStatus::Excused;
        let second = store.upsert_record(&excused).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, AttendanceStatus::Excused);
        assert_eq!(store.list_records(session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_token_on_missing_session() {
        let store = MemoryAttendanceStore::new();
        let err = store
            .update_active_token(Uuid::new_v4(), Some("ATTEND:x:0:abc123"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, rollcall_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_token_on_closed_session_conflicts() {
        let store = MemoryAttendanceStore::new();
        let session = store
            .create_session(&CreateAttendanceSession {
                class_id: Uuid::new_v4(),
                date: Utc::now().date_naive(),
                geofence: None,
            })
            .await
            .unwrap();
        store.close_session(session.id).await.unwrap();

        let err = store
            .update_active_token(session.id, Some("late"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, rollcall_core::error::ErrorKind::Conflict);
        let stored = store.read_session(session.id).await.unwrap().unwrap();
        assert!(stored.active_token.is_none());
    }

    #[tokio::test]
    async fn test_close_clears_token() {
        let store = MemoryAttendanceStore::new();
        let session = store
            .create_session(&CreateAttendanceSession {
                class_id: Uuid::new_v4(),
                date: Utc::now().date_naive(),
                geofence: None,
            })
            .await
            .unwrap();
        store
            .update_active_token(session.id, Some("token"))
            .await
            .unwrap();

        let closed = store.close_session(session.id).await.unwrap().unwrap();
        assert!(!closed.is_open);
        assert!(closed.active_token.is_none());
        assert!(store.close_session(Uuid::new_v4()).await.unwrap().is_none());
    }
}
