//! # rollcall-database
//!
//! PostgreSQL access for attendance sessions and records: the connected
//! [`AttendanceDatabase`] handle and the repositories it hands out.

pub mod pool;
pub mod repositories;

pub use pool::{AttendanceDatabase, DatabaseHealth};
