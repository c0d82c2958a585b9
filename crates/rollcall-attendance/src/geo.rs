//! Geofence distance checks.

use rollcall_entity::geo::{GeoPoint, Geofence};

use crate::error::VerificationError;

/// Mean Earth radius (IUGG), meters.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// Check a device location against a session geofence.
///
/// The boundary is inclusive: a device exactly `radius_meters` away passes.
pub fn check_geofence(fence: &Geofence, location: Option<GeoPoint>) -> Result<(), VerificationError> {
    let Some(location) = location else {
        return Err(VerificationError::LocationRequired);
    };

    let distance_meters = haversine_distance_meters(fence.center, location);
    if distance_meters <= fence.radius_meters {
        Ok(())
    } else {
        Err(VerificationError::OutOfRange {
            distance_meters,
            radius_meters: fence.radius_meters,
        })
    }
}
