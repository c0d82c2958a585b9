//! Convenience result type alias for Rollcall.

use crate::error::AppError;

/// A specialized `Result` type for Rollcall operations.
pub type AppResult<T> = Result<T, AppError>;
