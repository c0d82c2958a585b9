//! Attendance token generation and rotation.

pub mod display;
pub mod scheduler;
pub mod token_generator;

pub use display::{DisplayFeed, TokenDisplay};
pub use scheduler::RotationScheduler;
pub use token_generator::{GeneratedToken, TokenGenerator};
