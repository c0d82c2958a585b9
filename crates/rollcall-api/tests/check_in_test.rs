//! Integration tests for student check-in.

mod helpers;

use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use rollcall_attendance::AttendanceStore;

/// Roughly 80 m north of (0, 0).
const EIGHTY_METERS_NORTH: (f64, f64) = (80.0 / 111_195.0, 0.0);

fn classroom_fence() -> serde_json::Value {
    serde_json::json!({ "latitude": 0.0, "longitude": 0.0, "radius_meters": 50.0 })
}

#[tokio::test]
async fn test_check_in_then_duplicate() {
    let app = helpers::TestApp::new();
    let id = app.open_session(None).await;
    let token = app.start_rotation(id).await;
    let student = Uuid::new_v4();

    let first = app.check_in(student, &token, None).await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["data"]["duplicate"], false);
    assert_eq!(first.body["data"]["record"]["status"], "present");
    assert_eq!(first.body["data"]["record"]["student_id"], student.to_string());

    let second = app.check_in(student, &token, None).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["data"]["duplicate"], true);
    assert_eq!(second.body["data"]["outcome"], "already_done");
    assert!(second.body["data"]["record"].is_null());

    assert_eq!(app.store.record_count().await, 1);
}

#[tokio::test]
async fn test_check_in_requires_identity() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/attendance/check-in",
            Some(serde_json::json!({ "token": "ATTEND:x:0:abc123" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_is_malformed() {
    let app = helpers::TestApp::new();

    let response = app.check_in(Uuid::new_v4(), "garbage", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "MALFORMED_TOKEN");
    assert_eq!(response.body["details"]["outcome"], "invalid");
}

#[tokio::test]
async fn test_unknown_session() {
    let app = helpers::TestApp::new();
    let token = format!("ATTEND:{}:{}:abc123", Uuid::new_v4(), Utc::now().timestamp_millis());

    let response = app.check_in(Uuid::new_v4(), &token, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_expired_token() {
    let app = helpers::TestApp::new();
    let id = app.open_session(None).await;
    let old = format!(
        "ATTEND:{}:{}:abc123",
        id,
        Utc::now().timestamp_millis() - 31_000
    );
    app.store.update_active_token(id, Some(&old)).await.unwrap();

    let response = app.check_in(Uuid::new_v4(), &old, None).await;

    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.body["error"], "TOKEN_EXPIRED");
    assert_eq!(response.body["details"]["outcome"], "retry");
    assert_eq!(app.store.record_count().await, 0);
}

#[tokio::test]
async fn test_superseded_token_is_stale() {
    let app = helpers::TestApp::new();
    let id = app.open_session(None).await;
    let old = app.start_rotation(id).await;
    app.request(
        "POST",
        &format!("/api/attendance/sessions/{}/rotation/refresh", id),
        None,
        None,
    )
    .await;

    let response = app.check_in(Uuid::new_v4(), &old, None).await;

    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.body["error"], "TOKEN_STALE");
}

#[tokio::test]
async fn test_closed_session() {
    let app = helpers::TestApp::new();
    let id = app.open_session(None).await;
    let token = app.start_rotation(id).await;
    app.request(
        "POST",
        &format!("/api/attendance/sessions/{}/close", id),
        None,
        None,
    )
    .await;

    let response = app.check_in(Uuid::new_v4(), &token, None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "SESSION_CLOSED");
    assert_eq!(response.body["details"]["outcome"], "not_eligible");
}

#[tokio::test]
async fn test_geofence_location_required() {
    let app = helpers::TestApp::new();
    let id = app.open_session(Some(classroom_fence())).await;
    let token = app.start_rotation(id).await;

    let response = app.check_in(Uuid::new_v4(), &token, None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "LOCATION_REQUIRED");
}

#[tokio::test]
async fn test_geofence_out_of_range() {
    let app = helpers::TestApp::new();
    let id = app.open_session(Some(classroom_fence())).await;
    let token = app.start_rotation(id).await;

    let response = app
        .check_in(Uuid::new_v4(), &token, Some(EIGHTY_METERS_NORTH))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "OUT_OF_RANGE");
    assert_eq!(response.body["details"]["distance_meters"], 80.0);
    assert_eq!(response.body["details"]["radius_meters"], 50.0);
    assert_eq!(app.store.record_count().await, 0);
}

#[tokio::test]
async fn test_geofence_inside() {
    let app = helpers::TestApp::new();
    let id = app.open_session(Some(classroom_fence())).await;
    let token = app.start_rotation(id).await;

    let response = app
        .check_in(Uuid::new_v4(), &token, Some((0.0001, 0.0001)))
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["duplicate"], false);
}

#[tokio::test]
async fn test_invalid_location_rejected() {
    let app = helpers::TestApp::new();
    let id = app.open_session(Some(classroom_fence())).await;
    let token = app.start_rotation(id).await;

    let response = app.check_in(Uuid::new_v4(), &token, Some((95.0, 0.0))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}
