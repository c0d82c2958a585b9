//! Check-in verification error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rollcall_core::error::AppError;

/// Why a scan was rejected.
///
/// Every variant is terminal for the scan attempt; nothing is retried
/// automatically.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("the scanned code is not an attendance token")]
    MalformedToken,

    #[error("attendance session not found")]
    SessionNotFound,

    #[error("attendance session is closed")]
    SessionClosed,

    #[error("attendance token has expired")]
    TokenExpired,

    #[error("attendance token has been replaced by a newer one")]
    TokenStale,

    #[error("device location is required for this session")]
    LocationRequired,

    #[error("device is {distance_meters:.0} m from the session location (limit {radius_meters:.0} m)")]
    OutOfRange {
        distance_meters: f64,
        radius_meters: f64,
    },

    #[error("attendance already recorded")]
    AlreadyRecorded,

    #[error("attendance store failure: {0}")]
    PersistenceFailure(#[from] AppError),
}

/// How the scanning screen should treat a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    /// Rescan the current code.
    Retry,
    /// The student cannot check in to this session from here.
    NotEligible,
    /// Nothing to do; attendance is already on file.
    AlreadyDone,
    /// The scanned code was not an attendance code.
    Invalid,
    /// Infrastructure problem.
    Unavailable,
}

impl VerificationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenStale => "TOKEN_STALE",
            Self::LocationRequired => "LOCATION_REQUIRED",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::AlreadyRecorded => "ALREADY_RECORDED",
            Self::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }

    /// Outcome class for the scanning screen.
    pub fn class(&self) -> OutcomeClass {
        match self {
            Self::TokenExpired | Self::TokenStale => OutcomeClass::Retry,
            Self::SessionNotFound
            | Self::SessionClosed
            | Self::LocationRequired
            | Self::OutOfRange { .. } => OutcomeClass::NotEligible,
            Self::AlreadyRecorded => OutcomeClass::AlreadyDone,
            Self::MalformedToken => OutcomeClass::Invalid,
            Self::PersistenceFailure(_) => OutcomeClass::Unavailable,
        }
    }

    /// Short message shown to the student.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MalformedToken => "That code is not an attendance code.",
            Self::SessionNotFound => "This attendance session does not exist.",
            Self::SessionClosed => "Attendance for this session is closed.",
            Self::TokenExpired => "The code has expired. Scan the current code on screen.",
            Self::TokenStale => "The code was refreshed. Scan the current code on screen.",
            Self::LocationRequired => "Turn on location access to check in to this session.",
            Self::OutOfRange { .. } => "You are too far from the classroom to check in.",
            Self::AlreadyRecorded => "Your attendance is already recorded.",
            Self::PersistenceFailure(_) => "Attendance is temporarily unavailable. Try again shortly.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_vs_not_eligible_vs_done() {
        assert_eq!(VerificationError::TokenExpired.class(), OutcomeClass::Retry);
        assert_eq!(VerificationError::TokenStale.class(), OutcomeClass::Retry);
        assert_eq!(VerificationError::SessionClosed.class(), OutcomeClass::NotEligible);
        assert_eq!(
            VerificationError::OutOfRange {
                distance_meters: 80.0,
                radius_meters: 50.0
            }
            .class(),
            OutcomeClass::NotEligible
        );
        assert_eq!(VerificationError::AlreadyRecorded.class(), OutcomeClass::AlreadyDone);
    }

    #[test]
    fn test_out_of_range_message_carries_distance() {
        let err = VerificationError::OutOfRange {
            distance_meters: 80.4,
            radius_meters: 50.0,
        };
        assert_eq!(
            err.to_string(),
            "device is 80 m from the session location (limit 50 m)"
        );
        assert_eq!(err.code(), "OUT_OF_RANGE");
    }
}
