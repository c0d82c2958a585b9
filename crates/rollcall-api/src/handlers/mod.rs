//! HTTP request handlers.

pub mod check_in;
pub mod health;
pub mod rotation;
pub mod sessions;
