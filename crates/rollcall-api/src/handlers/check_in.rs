//! Student check-in handler.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use rollcall_attendance::VerificationError;

use crate::dto::request::CheckInRequest;
use crate::dto::response::{ApiResponse, CheckInResponse};
use crate::error::ApiError;
use crate::extractors::StudentId;
use crate::state::AppState;

/// POST /api/attendance/check-in
///
/// A duplicate scan is not an error for the student: it answers 200 with
/// `duplicate: true`.
pub async fn check_in(
    State(state): State<AppState>,
    StudentId(student_id): StudentId,
    Json(req): Json<CheckInRequest>,
) -> Result<Json<ApiResponse<CheckInResponse>>, ApiError> {
    req.validate()?;

    let location = req.location.map(Into::into);
    match state.verifier.verify(&req.token, student_id, location).await {
        Ok(record) => Ok(Json(ApiResponse::ok(CheckInResponse {
            record: Some(record),
            duplicate: false,
            outcome: None,
            message: "Attendance recorded.".to_string(),
        }))),
        Err(err @ VerificationError::AlreadyRecorded) => Ok(Json(ApiResponse::ok(CheckInResponse {
            record: None,
            duplicate: true,
            outcome: Some(err.class()),
            message: err.user_message().to_string(),
        }))),
        Err(err) => Err(err.into()),
    }
}
