//! Attendance token wire format.
//!
//! A token is the only thing that crosses the screen-to-camera channel:
//!
//! ```text
//! ATTEND:<session_id>:<issued_at_ms>:<nonce>
//! ```
//!
//! The session id is a hyphenated UUID, the timestamp is milliseconds since
//! the Unix epoch, and the nonce is six ASCII alphanumerics. The token is a
//! bearer credential with no signature; authority comes from matching the
//! session's stored `active_token`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use uuid::Uuid;

use crate::error::VerificationError;

/// Leading marker of every attendance token.
pub const TOKEN_MARKER: &str = "ATTEND";

/// Nonce length in characters.
pub const NONCE_LENGTH: usize = 6;

/// A decoded attendance token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceToken {
    /// Session the token was issued for.
    pub session_id: Uuid,
    /// Generation time, milliseconds since epoch.
    pub issued_at_ms: i64,
    /// Random nonce making tokens unique within the same millisecond.
    pub nonce: String,
}

impl AttendanceToken {
    /// Issue a new token for `session_id` stamped with `issued_at`.
    pub fn issue(session_id: Uuid, issued_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            issued_at_ms: issued_at.timestamp_millis(),
            nonce: Alphanumeric.sample_string(&mut rand::rng(), NONCE_LENGTH),
        }
    }

    /// The embedded generation time.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.issued_at_ms)
    }

    /// Milliseconds elapsed between generation and `now`. Negative when the
    /// token is future-dated.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis().saturating_sub(self.issued_at_ms)
    }
}

impl fmt::Display for AttendanceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            TOKEN_MARKER, self.session_id, self.issued_at_ms, self.nonce
        )
    }
}

impl FromStr for AttendanceToken {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(marker), Some(session), Some(millis), Some(nonce), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(VerificationError::MalformedToken);
        };

        if marker != TOKEN_MARKER {
            return Err(VerificationError::MalformedToken);
        }

        let session_id =
            Uuid::parse_str(session).map_err(|_| VerificationError::MalformedToken)?;

        // i64::from_str accepts a leading sign; the wire format does not.
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VerificationError::MalformedToken);
        }
        let issued_at_ms = millis
            .parse::<i64>()
            .map_err(|_| VerificationError::MalformedToken)?;

        if nonce.len() != NONCE_LENGTH || !nonce.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(VerificationError::MalformedToken);
        }

        Ok(Self {
            session_id,
            issued_at_ms,
            nonce: nonce.to_string(),
        })
    }
}
