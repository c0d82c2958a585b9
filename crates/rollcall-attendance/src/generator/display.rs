//! Read-only view of a running rotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use super::token_generator::GeneratedToken;

/// What a display surface renders: the current token and a countdown.
///
/// The countdown is cosmetic. Validity is always decided from the timestamp
/// embedded in the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDisplay {
    pub session_id: Uuid,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub seconds_remaining: u64,
    pub persisted: bool,
    pub warning: Option<String>,
}

/// Subscription to a session's rotating token and countdown.
///
/// Any number of feeds may observe one rotation. A feed ends when the
/// rotation is stopped.
#[derive(Debug, Clone)]
pub struct DisplayFeed {
    session_id: Uuid,
    token: watch::Receiver<Option<GeneratedToken>>,
    countdown: watch::Receiver<u64>,
}

impl DisplayFeed {
    pub(crate) fn new(
        session_id: Uuid,
        token: watch::Receiver<Option<GeneratedToken>>,
        countdown: watch::Receiver<u64>,
    ) -> Self {
        Self {
            session_id,
            token,
            countdown,
        }
    }

    /// Session this feed belongs to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The latest token and countdown, or `None` before the first token.
    pub fn snapshot(&self) -> Option<TokenDisplay> {
        let generated = self.token.borrow().clone()?;
        let seconds_remaining = *self.countdown.borrow();
        Some(TokenDisplay {
            session_id: generated.session_id,
            token: generated.token,
            issued_at: generated.issued_at,
            expires_at: generated.expires_at,
            seconds_remaining,
            persisted: generated.persisted,
            warning: generated.warning,
        })
    }

    /// Waits until the first token exists and returns the current snapshot.
    /// Returns `None` if the rotation stops first.
    pub async fn current(&mut self) -> Option<TokenDisplay> {
        self.token.wait_for(Option::is_some).await.ok()?;
        self.snapshot()
    }

    /// Waits for the next token or countdown change.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        tokio::select! {
            res = self.token.changed() => res,
            res = self.countdown.changed() => res,
        }
    }
}
