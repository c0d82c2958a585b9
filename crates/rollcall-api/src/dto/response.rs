//! Response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rollcall_attendance::{OutcomeClass, TokenDisplay};
use rollcall_entity::attendance::AttendanceRecord;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Configured store backend.
    pub store: String,
    /// `connected`, `unreachable`, or `not_configured`.
    pub database: String,
}

/// Check-in outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    /// The new record; absent for duplicates.
    pub record: Option<AttendanceRecord>,
    /// True when attendance was already on file.
    pub duplicate: bool,
    /// Outcome class for duplicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OutcomeClass>,
    /// Message for the student.
    pub message: String,
}

/// Rotation state for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationResponse {
    pub session_id: Uuid,
    pub running: bool,
    /// Current token, when rotating.
    pub display: Option<TokenDisplay>,
}
