//! # rollcall-attendance
//!
//! QR attendance for Rollcall: a rotating, session-bound credential and the
//! verifier that turns a scan into exactly one attendance record.
//!
//! ## Modules
//!
//! - `token`: the `ATTEND:<session>:<millis>:<nonce>` wire format
//! - `generator`: token generation and the per-session rotation scheduler
//! - `verifier`: scan verification (freshness, match, geofence, duplicates)
//! - `geo`: great-circle distance and geofence checks
//! - `store`: the session/record store contract and its implementations
//! - `manager`: opening, closing, and teacher-side record management

pub mod error;
pub mod generator;
pub mod geo;
pub mod manager;
pub mod store;
pub mod token;
pub mod verifier;

pub use error::{OutcomeClass, VerificationError};
pub use generator::{DisplayFeed, GeneratedToken, RotationScheduler, TokenDisplay, TokenGenerator};
pub use manager::AttendanceManager;
pub use store::{AttendanceStore, MemoryAttendanceStore, PgAttendanceStore, RecordInsert};
pub use token::AttendanceToken;
pub use verifier::Verifier;
