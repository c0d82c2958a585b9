//! Repository implementations for attendance entities.

pub mod attendance_record;
pub mod attendance_session;

pub use attendance_record::AttendanceRecordRepository;
pub use attendance_session::AttendanceSessionRepository;
