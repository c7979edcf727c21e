//! The authenticated session and its lifecycle manager.

mod manager;

pub use manager::{AdminSession, AdminSessionBuilder};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::format;

/// Persisted record of the active session.
///
/// Timestamps are serialized as int64 milliseconds. The `session_id` is for
/// display and audit only; trust decisions never read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub is_authenticated: bool,
    /// Set once at login, immutable thereafter.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub login_time: DateTime<Utc>,
    /// Updated on every detected activity event and on explicit extension.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_activity: DateTime<Utc>,
    /// True once the idle warning fired for the current activity window.
    pub warning_shown: bool,
    pub session_id: String,
}

impl SessionRecord {
    pub(crate) fn new(now: DateTime<Utc>, session_id: String) -> Self {
        Self {
            is_authenticated: true,
            login_time: now,
            last_activity: now,
            warning_shown: false,
            session_id,
        }
    }

    /// Idle time as of `now`.
    pub fn idle(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity
    }

    /// True once the idle clock has outlived `session_duration`.
    pub fn is_expired(&self, now: DateTime<Utc>, session_duration: Duration) -> bool {
        self.idle(now) >= session_duration
    }
}

/// The manager's current position in the lifecycle.
///
/// `WarningPending` is still authenticated; it means the idle warning has
/// fired and no activity has cleared it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Active,
    WarningPending,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Active | Self::WarningPending)
    }
}

/// Result of a login attempt.
///
/// Rejections are ordinary outcomes, not errors; every variant carries what
/// the UI needs to render, and [`message`](Self::message) renders a default
/// wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials accepted; a fresh session is live.
    Granted { session_id: String },
    /// Wrong passphrase. Contains attempts left before lockout.
    Denied { attempts_remaining: u32 },
    /// A lockout is active; the attempt was not counted.
    Locked { retry_after_secs: i64 },
}

impl LoginOutcome {
    /// Returns true if the login succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Human-readable outcome message.
    pub fn message(&self) -> String {
        match self {
            Self::Granted { .. } => "Login successful.".to_owned(),
            Self::Denied {
                attempts_remaining: 1,
            } => "Invalid passphrase. 1 attempt remaining.".to_owned(),
            Self::Denied { attempts_remaining } => {
                format!("Invalid passphrase. {attempts_remaining} attempts remaining.")
            }
            Self::Locked { retry_after_secs } => format!(
                "Too many failed attempts. Try again in {}.",
                format::clock_secs(*retry_after_secs)
            ),
        }
    }
}
