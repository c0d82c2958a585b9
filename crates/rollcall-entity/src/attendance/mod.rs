//! Attendance domain entities.

pub mod record;
pub mod session;

pub use record::{AttendanceRecord, CreateAttendanceRecord};
pub use session::{AttendanceSession, CreateAttendanceSession};

use serde::{Deserialize, Serialize};

/// Outcome recorded for a student in an attendance session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Checked in, by scan or by the teacher.
    Present,
    /// Absence excused by the teacher.
    Excused,
    /// Absent through illness.
    Sick,
    /// Absent without excuse.
    Absent,
}

impl AttendanceStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Excused => "excused",
            Self::Sick => "sick",
            Self::Absent => "absent",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = rollcall_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "excused" => Ok(Self::Excused),
            "sick" => Ok(Self::Sick),
            "absent" => Ok(Self::Absent),
            _ => Err(rollcall_core::AppError::validation(format!(
                "Invalid attendance status: '{s}'"
            ))),
        }
    }
}
