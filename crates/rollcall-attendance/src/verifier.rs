//! Check-in verification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use rollcall_core::config::AttendanceConfig;
use rollcall_entity::attendance::{AttendanceRecord, AttendanceStatus, CreateAttendanceRecord};
use rollcall_entity::geo::GeoPoint;

use crate::error::VerificationError;
use crate::geo::check_geofence;
use crate::store::{AttendanceStore, RecordInsert};
use crate::token::AttendanceToken;

/// Turns a scanned token into at most one attendance record.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. the token parses
/// 2. its session exists and is open
/// 3. it is within its lifetime (plus clock-skew tolerance)
/// 4. it is the session's active token
/// 5. the device is inside the geofence, when the session has one
/// 6. the student has no record yet
///
/// Only then is a `present` record inserted. Rejections have no side effects.
#[derive(Debug, Clone)]
pub struct Verifier {
    store: Arc<dyn AttendanceStore>,
    lifetime_ms: i64,
    skew_ms: i64,
}

impl Verifier {
    /// Creates a verifier with explicit timing windows.
    pub fn new(store: Arc<dyn AttendanceStore>, lifetime_ms: i64, skew_ms: i64) -> Self {
        Self {
            store,
            lifetime_ms,
            skew_ms,
        }
    }

    /// Creates a verifier from the attendance configuration.
    pub fn from_config(store: Arc<dyn AttendanceStore>, config: &AttendanceConfig) -> Self {
        Self::new(store, config.token_lifetime_ms(), config.clock_skew_ms())
    }

    /// Verify a scan at the current time.
    pub async fn verify(
        &self,
        scanned: &str,
        student_id: Uuid,
        location: Option<GeoPoint>,
    ) -> Result<AttendanceRecord, VerificationError> {
        self.verify_at(scanned, student_id, location, Utc::now()).await
    }

    /// Verify a scan as of `now`.
    pub async fn verify_at(
        &self,
        scanned: &str,
        student_id: Uuid,
        location: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, VerificationError> {
        let result = self.check_and_record(scanned.trim(), student_id, location, now).await;
        match &result {
            Ok(record) => info!(
                session_id = %record.attendance_id,
                student_id = %student_id,
                "Attendance recorded"
            ),
            Err(e) => debug!(
                student_id = %student_id,
                reason = e.code(),
                "Check-in rejected"
            ),
        }
        result
    }

    async fn check_and_record(
        &self,
        scanned: &str,
        student_id: Uuid,
        location: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, VerificationError> {
        let token: AttendanceToken = scanned.parse()?;

        let session = self
            .store
            .read_session(token.session_id)
            .await?
            .ok_or(VerificationError::SessionNotFound)?;
        if !session.is_open {
            return Err(VerificationError::SessionClosed);
        }

        self.check_freshness(&token, now)?;

        if !session.is_active_token(scanned) {
            return Err(VerificationError::TokenStale);
        }

        if let Some(fence) = session.geofence() {
            check_geofence(&fence, location)?;
        }

        if self
            .store
            .find_record(session.id, student_id)
            .await?
            .is_some()
        {
            return Err(VerificationError::AlreadyRecorded);
        }

        let insert = CreateAttendanceRecord {
            attendance_id: session.id,
            student_id,
            status: AttendanceStatus::Present,
            recorded_at: now,
        };
        match self.store.create_record(&insert).await? {
            RecordInsert::Inserted(record) => Ok(record),
            // Lost a race with a concurrent scan by the same student.
            RecordInsert::Conflict => Err(VerificationError::AlreadyRecorded),
        }
    }

    fn check_freshness(
        &self,
        token: &AttendanceToken,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let age_ms = token.age_ms(now);
        if age_ms > self.lifetime_ms + self.skew_ms || age_ms < -self.skew_ms {
            return Err(VerificationError::TokenExpired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAttendanceStore;
    use crate::store::test_support::open_session;
    use rollcall_entity::attendance::AttendanceSession;
    use rollcall_entity::geo::Geofence;

    const LIFETIME_MS: i64 = 30_000;
    const SKEW_MS: i64 = 500;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn token_at(session_id: Uuid, ms: i64) -> String {
        format!("ATTEND:{}:{}:abc123", session_id, ms)
    }

    struct Fixture {
        store: MemoryAttendanceStore,
        verifier: Verifier,
        session: AttendanceSession,
    }

    /// An open session whose active token was generated at t=0.
    async fn fixture(geofence: Option<Geofence>) -> Fixture {
        let store = MemoryAttendanceStore::new();
        let session = open_session(&store, geofence).await;
        store
            .update_active_token(session.id, Some(&token_at(session.id, 0)))
            .await
            .unwrap();
        let verifier = Verifier::new(Arc::new(store.clone()), LIFETIME_MS, SKEW_MS);
        let session = store.read_session(session.id).await.unwrap().unwrap();
        Fixture {
            store,
            verifier,
            session,
        }
    }

    fn classroom_fence() -> Geofence {
        Geofence {
            center: GeoPoint::new(0.0, 0.0),
            radius_meters: 50.0,
        }
    }

    #[tokio::test]
    async fn test_scan_at_29s_then_duplicate() {
        let f = fixture(None).await;
        let student = Uuid::new_v4();
        let token = token_at(f.session.id, 0);

        let record = f
            .verifier
            .verify_at(&token, student, None, at(29_000))
            .await
            .unwrap();
        assert_eq!(record.attendance_id, f.session.id);
        assert_eq!(record.student_id, student);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.recorded_at, at(29_000));

        let again = f.verifier.verify_at(&token, student, None, at(29_500)).await;
        assert!(matches!(again, Err(VerificationError::AlreadyRecorded)));
        assert_eq!(f.store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_scan_at_31s_is_expired() {
        let f = fixture(None).await;
        let result = f
            .verifier
            .verify_at(&token_at(f.session.id, 0), Uuid::new_v4(), None, at(31_000))
            .await;
        assert!(matches!(result, Err(VerificationError::TokenExpired)));
        assert_eq!(f.store.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_skew_window_edges() {
        let f = fixture(None).await;
        let token = token_at(f.session.id, 0);

        let late = f
            .verifier
            .verify_at(&token, Uuid::new_v4(), None, at(LIFETIME_MS + SKEW_MS + 1))
            .await;
        assert!(matches!(late, Err(VerificationError::TokenExpired)));

        let future = f
            .verifier
            .verify_at(&token, Uuid::new_v4(), None, at(-SKEW_MS - 1))
            .await;
        assert!(matches!(future, Err(VerificationError::TokenExpired)));

        f.verifier
            .verify_at(&token, Uuid::new_v4(), None, at(LIFETIME_MS + SKEW_MS))
            .await
            .unwrap();
        f.verifier
            .verify_at(&token, Uuid::new_v4(), None, at(-SKEW_MS))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let f = fixture(None).await;
        let result = f
            .verifier
            .verify_at("garbage", Uuid::new_v4(), None, at(1_000))
            .await;
        assert!(matches!(result, Err(VerificationError::MalformedToken)));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let f = fixture(None).await;
        let result = f
            .verifier
            .verify_at(&token_at(Uuid::new_v4(), 0), Uuid::new_v4(), None, at(1_000))
            .await;
        assert!(matches!(result, Err(VerificationError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_closed_session() {
        let f = fixture(None).await;
        let mut closed = f.session.clone();
        closed.is_open = false;
        f.store.put_session(closed).await;

        let result = f
            .verifier
            .verify_at(&token_at(f.session.id, 0), Uuid::new_v4(), None, at(1_000))
            .await;
        assert!(matches!(result, Err(VerificationError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_superseded_token_is_stale() {
        let f = fixture(None).await;
        let old = token_at(f.session.id, 0);
        f.store
            .update_active_token(f.session.id, Some(&token_at(f.session.id, 30_000)))
            .await
            .unwrap();

        let result = f
            .verifier
            .verify_at(&old, Uuid::new_v4(), None, at(29_000))
            .await;
        assert!(matches!(result, Err(VerificationError::TokenStale)));
    }

    #[tokio::test]
    async fn test_session_without_active_token_is_stale() {
        let f = fixture(None).await;
        let mut fresh = f.session.clone();
        fresh.active_token = None;
        f.store.put_session(fresh).await;

        let result = f
            .verifier
            .verify_at(&token_at(f.session.id, 0), Uuid::new_v4(), None, at(1_000))
            .await;
        assert!(matches!(result, Err(VerificationError::TokenStale)));
    }

    #[tokio::test]
    async fn test_token_bound_to_its_session() {
        let s1 = fixture(None).await;
        let s2 = open_session(&s1.store, None).await;
        let s2_token = token_at(s2.id, 0);
        s1.store
            .update_active_token(s2.id, Some(&s2_token))
            .await
            .unwrap();
        let student = Uuid::new_v4();

        // S2's token records attendance for S2 only.
        let record = s1
            .verifier
            .verify_at(&s2_token, student, None, at(1_000))
            .await
            .unwrap();
        assert_eq!(record.attendance_id, s2.id);
        assert!(
            s1.store
                .find_record(s1.session.id, student)
                .await
                .unwrap()
                .is_none()
        );

        // Rewriting the session id does not turn S2's credential into S1's.
        let rewritten = s2_token.replace(&s2.id.to_string(), &s1.session.id.to_string());
        let rewritten = rewritten.replace(":abc123", ":zzz999");
        let result = s1
            .verifier
            .verify_at(&rewritten, student, None, at(1_000))
            .await;
        assert!(matches!(result, Err(VerificationError::TokenStale)));
    }

    #[tokio::test]
    async fn test_geofence_requires_location() {
        let f = fixture(Some(classroom_fence())).await;
        let result = f
            .verifier
            .verify_at(&token_at(f.session.id, 0), Uuid::new_v4(), None, at(1_000))
            .await;
        assert!(matches!(result, Err(VerificationError::LocationRequired)));
    }

    #[tokio::test]
    async fn test_device_80m_away_is_out_of_range() {
        let f = fixture(Some(classroom_fence())).await;
        let device = GeoPoint::new(80.0 / 111_195.0, 0.0);
        let result = f
            .verifier
            .verify_at(&token_at(f.session.id, 0), Uuid::new_v4(), Some(device), at(1_000))
            .await;
        match result {
            Err(VerificationError::OutOfRange {
                distance_meters,
                radius_meters,
            }) => {
                assert!((distance_meters - 80.0).abs() < 0.5);
                assert_eq!(radius_meters, 50.0);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
        assert_eq!(f.store.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_device_inside_fence_is_recorded() {
        let f = fixture(Some(classroom_fence())).await;
        let device = GeoPoint::new(20.0 / 111_195.0, 0.0);
        f.verifier
            .verify_at(&token_at(f.session.id, 0), Uuid::new_v4(), Some(device), at(1_000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_checks_run_in_order() {
        // Closed, expired, and out of range at once: closed wins.
        let f = fixture(Some(classroom_fence())).await;
        let mut closed = f.session.clone();
        closed.is_open = false;
        f.store.put_session(closed).await;

        let result = f
            .verifier
            .verify_at(&token_at(f.session.id, 0), Uuid::new_v4(), None, at(60_000))
            .await;
        assert!(matches!(result, Err(VerificationError::SessionClosed)));

        // Expired beats stale.
        let f = fixture(None).await;
        let result = f
            .verifier
            .verify_at(&token_at(f.session.id, 1), Uuid::new_v4(), None, at(60_000))
            .await;
        assert!(matches!(result, Err(VerificationError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_concurrent_scans_record_once() {
        let f = fixture(None).await;
        let student = Uuid::new_v4();
        let token = token_at(f.session.id, 0);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let verifier = f.verifier.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                verifier.verify_at(&token, student, None, at(1_000)).await
            }));
        }

        let mut recorded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => recorded += 1,
                Err(VerificationError::AlreadyRecorded) => {}
                Err(other) => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(recorded, 1);
        assert_eq!(f.store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_ignored() {
        let f = fixture(None).await;
        let scanned = format!("{}\n", token_at(f.session.id, 0));
        f.verifier
            .verify_at(&scanned, Uuid::new_v4(), None, at(1_000))
            .await
            .unwrap();
    }
}
