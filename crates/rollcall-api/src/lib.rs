//! # rollcall-api
//!
//! HTTP API layer for Rollcall built on Axum.
//!
//! Exposes session management, token rotation and display (snapshot and
//! Server-Sent Events), and student check-in, plus middleware, extractors,
//! DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
