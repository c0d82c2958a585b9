//! # rollcall-entity
//!
//! Domain entity models for Rollcall. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`.

pub mod attendance;
pub mod geo;
