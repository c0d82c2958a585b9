//! `StudentId` extractor: the caller's identity as asserted by the upstream
//! auth gateway.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use rollcall_core::error::AppError;

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The student making the request. Trusted as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentId(pub Uuid);

impl<S> FromRequestParts<S> for StudentId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing x-user-id header"))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::unauthorized("Invalid x-user-id header"))?;

        Ok(Self(id))
    }
}
