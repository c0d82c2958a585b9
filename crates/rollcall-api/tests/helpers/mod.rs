//! Shared test helpers for API integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use rollcall_api::{AppState, build_app};
use rollcall_attendance::MemoryAttendanceStore;
use rollcall_core::config::{AppConfig, StoreBackend};

/// Test application context backed by the in-memory store.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for inspecting the scheduler
    pub state: AppState,
    /// Direct store access
    pub store: MemoryAttendanceStore,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.attendance.store = StoreBackend::Memory;

        let store = MemoryAttendanceStore::new();
        let state = AppState::new(config.clone(), Arc::new(store.clone()), None);
        let router = build_app(state.clone(), &config.server);

        Self {
            router,
            state,
            store,
        }
    }

    /// Send a request and return the raw response.
    pub async fn raw_request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<Uuid>,
    ) -> Response<Body> {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(user) = user {
            req = req.header("x-user-id", user.to_string());
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request")
    }

    /// Send a request and parse the JSON response.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<Uuid>,
    ) -> TestResponse {
        let response = self.raw_request(method, path, body, user).await;

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Open a session and return its id.
    pub async fn open_session(&self, geofence: Option<Value>) -> Uuid {
        let mut body = serde_json::json!({ "class_id": Uuid::new_v4() });
        if let Some(geofence) = geofence {
            body["geofence"] = geofence;
        }

        let response = self
            .request("POST", "/api/attendance/sessions", Some(body), None)
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

        serde_json::from_value(response.body["data"]["id"].clone()).expect("session id")
    }

    /// Start rotation and return the first token.
    pub async fn start_rotation(&self, session_id: Uuid) -> String {
        let response = self
            .request(
                "POST",
                &format!("/api/attendance/sessions/{}/rotation", session_id),
                None,
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

        response.body["data"]["display"]["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    /// Check in as `student` with `token` and an optional location.
    pub async fn check_in(
        &self,
        student: Uuid,
        token: &str,
        location: Option<(f64, f64)>,
    ) -> TestResponse {
        let mut body = serde_json::json!({ "token": token });
        if let Some((latitude, longitude)) = location {
            body["location"] = serde_json::json!({ "latitude": latitude, "longitude": longitude });
        }
        self.request("POST", "/api/attendance/check-in", Some(body), Some(student))
            .await
    }
}
