//! Attendance session entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::geo::{GeoPoint, Geofence};

/// One class's attendance-taking window for a given date.
///
/// `active_token` is written only by the token generator and is overwritten
/// on every rotation. Token freshness is carried inside the token itself, so
/// there is no expiry column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// The class this session belongs to.
    pub class_id: Uuid,
    /// Calendar date the session covers.
    pub date: NaiveDate,
    /// Whether check-ins are currently accepted.
    pub is_open: bool,
    /// The currently valid attendance token, if a generator has published one.
    pub active_token: Option<String>,
    /// Geofence center latitude.
    pub location_latitude: Option<f64>,
    /// Geofence center longitude.
    pub location_longitude: Option<f64>,
    /// Geofence radius in meters.
    pub radius_meters: Option<f64>,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl AttendanceSession {
    /// The geofence, when center and radius are all configured.
    pub fn geofence(&self) -> Option<Geofence> {
        match (
            self.location_latitude,
            self.location_longitude,
            self.radius_meters,
        ) {
            (Some(latitude), Some(longitude), Some(radius_meters)) => Some(Geofence {
                center: GeoPoint::new(latitude, longitude),
                radius_meters,
            }),
            _ => None,
        }
    }

    /// Whether `token` is the session's current credential.
    pub fn is_active_token(&self, token: &str) -> bool {
        self.active_token.as_deref() == Some(token)
    }
}

/// Data required to open a new attendance session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceSession {
    /// Owning class.
    pub class_id: Uuid,
    /// Calendar date.
    pub date: NaiveDate,
    /// Optional geofence.
    pub geofence: Option<Geofence>,
}
