//! Attendance token rotation and verification configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound for the verifier's clock-skew allowance. Anything wider lets a
/// photographed token be replayed well after the room has moved on.
pub const MAX_CLOCK_SKEW_TOLERANCE_MS: u64 = 5_000;

/// Upper bound for a token's lifetime. Tokens are meant to live for one
/// rotation of a classroom display, not for a whole lecture.
pub const MAX_TOKEN_LIFETIME_SECONDS: u64 = 3_600;

/// Attendance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceConfig {
    /// Which session store backs the service.
    #[serde(default)]
    pub store: StoreBackend,
    /// Seconds between token rotations.
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval_seconds: u64,
    /// Seconds a token stays valid after generation.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_seconds: u64,
    /// Seconds between cosmetic countdown ticks on display surfaces.
    #[serde(default = "default_countdown_tick")]
    pub countdown_tick_seconds: u64,
    /// Extra milliseconds accepted on either side of the validity window.
    #[serde(default = "default_clock_skew_tolerance")]
    pub clock_skew_tolerance_ms: u64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::default(),
            rotation_interval_seconds: default_rotation_interval(),
            token_lifetime_seconds: default_token_lifetime(),
            countdown_tick_seconds: default_countdown_tick(),
            clock_skew_tolerance_ms: default_clock_skew_tolerance(),
        }
    }
}

impl AttendanceConfig {
    /// Rotation period as a [`Duration`].
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_seconds)
    }

    /// Countdown tick period as a [`Duration`].
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_secs(self.countdown_tick_seconds)
    }

    /// Token lifetime in milliseconds.
    ///
    /// Saturates instead of wrapping for values [`validate`](Self::validate)
    /// would reject.
    pub fn token_lifetime_ms(&self) -> i64 {
        i64::try_from(self.token_lifetime_seconds)
            .ok()
            .and_then(|secs| secs.checked_mul(1_000))
            .unwrap_or(i64::MAX)
    }

    /// Clock-skew tolerance in milliseconds.
    pub fn clock_skew_ms(&self) -> i64 {
        i64::try_from(self.clock_skew_tolerance_ms).unwrap_or(i64::MAX)
    }

    /// Reject settings that would break rotation or weaken freshness checks.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.rotation_interval_seconds == 0 {
            return Err(AppError::configuration(
                "attendance.rotation_interval_seconds must be greater than zero",
            ));
        }
        if self.token_lifetime_seconds == 0 {
            return Err(AppError::configuration(
                "attendance.token_lifetime_seconds must be greater than zero",
            ));
        }
        if self.token_lifetime_seconds > MAX_TOKEN_LIFETIME_SECONDS {
            return Err(AppError::configuration(format!(
                "attendance.token_lifetime_seconds must not exceed {MAX_TOKEN_LIFETIME_SECONDS}"
            )));
        }
        if self.countdown_tick_seconds == 0 {
            return Err(AppError::configuration(
                "attendance.countdown_tick_seconds must be greater than zero",
            ));
        }
        if self.clock_skew_tolerance_ms > MAX_CLOCK_SKEW_TOLERANCE_MS {
            return Err(AppError::configuration(format!(
                "attendance.clock_skew_tolerance_ms must not exceed {MAX_CLOCK_SKEW_TOLERANCE_MS}"
            )));
        }
        Ok(())
    }
}

/// Session store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// PostgreSQL via the connection pool.
    Postgres,
    /// Process-local store. Single node only; data is lost on restart.
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Postgres
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

fn default_rotation_interval() -> u64 {
    30
}

fn default_token_lifetime() -> u64 {
    30
}

fn default_countdown_tick() -> u64 {
    1
}

fn default_clock_skew_tolerance() -> u64 {
    500
}
