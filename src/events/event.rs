use chrono::{DateTime, Utc};

/// Session lifecycle events pushed to registered listeners.
///
/// Events are always fired from the manager. If no listeners are registered,
/// they are silently ignored (no-op). All timestamps come from the manager's
/// injected clock.
#[derive(Debug, Clone)]
pub enum AdminEvent {
    /// The shortcut matched while logged out; the host should show the
    /// login surface.
    LoginPromptRequested { at: DateTime<Utc> },

    // authentication
    LoginSucceeded {
        session_id: String,
        at: DateTime<Utc>,
    },
    LoginFailed {
        attempts_remaining: u32,
        at: DateTime<Utc>,
    },

    // lockout
    LockoutStarted {
        retry_after_secs: i64,
        at: DateTime<Utc>,
    },
    /// Display-only countdown refresh while locked. No state changes here.
    LockoutCountdown {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    LockoutEnded { at: DateTime<Utc> },

    // session lifetime
    /// The idle warning threshold was crossed; fired once per activity window.
    SessionWarning {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// Explicit extension via `extend_session` (activity touches are silent).
    SessionExtended { at: DateTime<Utc> },
    /// The idle timeout elapsed; the session ended without a logout call.
    SessionExpired { at: DateTime<Utc> },
    /// Explicit logout.
    LoggedOut { at: DateTime<Utc> },
}

impl AdminEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginPromptRequested { .. } => "admin.login.prompt",
            Self::LoginSucceeded { .. } => "admin.login.success",
            Self::LoginFailed { .. } => "admin.login.failed",
            Self::LockoutStarted { .. } => "admin.lockout.started",
            Self::LockoutCountdown { .. } => "admin.lockout.countdown",
            Self::LockoutEnded { .. } => "admin.lockout.ended",
            Self::SessionWarning { .. } => "admin.session.warning",
            Self::SessionExtended { .. } => "admin.session.extended",
            Self::SessionExpired { .. } => "admin.session.expired",
            Self::LoggedOut { .. } => "admin.session.logged_out",
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoginPromptRequested { at }
            | Self::LoginSucceeded { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LockoutStarted { at, .. }
            | Self::LockoutCountdown { at, .. }
            | Self::LockoutEnded { at }
            | Self::SessionWarning { at, .. }
            | Self::SessionExtended { at }
            | Self::SessionExpired { at }
            | Self::LoggedOut { at } => *at,
        }
    }
}
