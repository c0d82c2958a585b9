//! Builds attendance tokens and publishes them as a session's active token.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use rollcall_core::error::{AppError, ErrorKind};

use crate::store::AttendanceStore;
use crate::token::AttendanceToken;

/// A freshly generated token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedToken {
    /// Session the token belongs to.
    pub session_id: Uuid,
    /// Encoded token string, as rendered in the QR code.
    pub token: String,
    /// Generation time embedded in the token.
    pub issued_at: DateTime<Utc>,
    /// End of the token's nominal validity window.
    pub expires_at: DateTime<Utc>,
    /// Whether the token was saved as the session's active token.
    pub persisted: bool,
    /// Operator-facing warning when `persisted` is false.
    pub warning: Option<String>,
}

/// Generates attendance tokens and writes them to the store.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    store: Arc<dyn AttendanceStore>,
    lifetime: Duration,
}

impl TokenGenerator {
    /// Creates a generator whose tokens are nominally valid for `lifetime_ms`.
    pub fn new(store: Arc<dyn AttendanceStore>, lifetime_ms: i64) -> Self {
        Self {
            store,
            lifetime: Duration::milliseconds(lifetime_ms),
        }
    }

    /// Generate a token for `session_id` at the current time.
    pub async fn generate(&self, session_id: Uuid) -> Result<GeneratedToken, AppError> {
        self.generate_at(session_id, Utc::now()).await
    }

    /// Generate a token for `session_id` stamped with `now`.
    ///
    /// A failed write does not fail generation: the token is still returned
    /// for display, flagged `persisted = false`. Scans of such a token are
    /// rejected as stale until a later write succeeds.
    ///
    /// Fails only when the session is closed or gone, since no later write
    /// can succeed either.
    pub async fn generate_at(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<GeneratedToken, AppError> {
        let token = AttendanceToken::issue(session_id, now).to_string();
        let expires_at = now + self.lifetime;

        match self.store.update_active_token(session_id, Some(&token)).await {
            Ok(()) => {
                debug!(session_id = %session_id, expires_at = %expires_at, "Attendance token rotated");
                Ok(GeneratedToken {
                    session_id,
                    token,
                    issued_at: now,
                    expires_at,
                    persisted: true,
                    warning: None,
                })
            }
            Err(e) if matches!(e.kind, ErrorKind::Conflict | ErrorKind::NotFound) => Err(e),
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to persist attendance token; scans will be rejected until the next rotation succeeds"
                );
                Ok(GeneratedToken {
                    session_id,
                    token,
                    issued_at: now,
                    expires_at,
                    persisted: false,
                    warning: Some(format!(
                        "This code could not be saved and will not be accepted: {}",
                        e.message
                    )),
                })
            }
        }
    }
}
