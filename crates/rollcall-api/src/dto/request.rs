//! Request DTOs with validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use rollcall_entity::attendance::AttendanceStatus;
use rollcall_entity::geo::{GeoPoint, Geofence};

/// A WGS-84 coordinate in a request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
}

impl From<LocationRequest> for GeoPoint {
    fn from(req: LocationRequest) -> Self {
        GeoPoint::new(req.latitude, req.longitude)
    }
}

/// Geofence for a new session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct GeofenceRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
    /// Radius in meters.
    #[validate(range(
        exclusive_min = 0.0,
        max = 100_000.0,
        message = "Radius must be greater than 0 and at most 100 km"
    ))]
    pub radius_meters: f64,
}

impl From<GeofenceRequest> for Geofence {
    fn from(req: GeofenceRequest) -> Self {
        Geofence {
            center: GeoPoint::new(req.latitude, req.longitude),
            radius_meters: req.radius_meters,
        }
    }
}

/// Open session request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpenSessionRequest {
    /// Owning class.
    pub class_id: Uuid,
    /// Calendar date; defaults to today (UTC).
    pub date: Option<NaiveDate>,
    /// Optional geofence.
    #[validate(nested)]
    pub geofence: Option<GeofenceRequest>,
}

/// Student check-in request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckInRequest {
    /// The scanned token string.
    #[validate(length(min = 1, max = 256, message = "Token is required"))]
    pub token: String,
    /// Device location, if the device shared one.
    #[validate(nested)]
    pub location: Option<LocationRequest>,
}

/// Teacher status override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkStatusRequest {
    pub status: AttendanceStatus,
}
