//! Admin session and authentication lifecycle management.
//!
//! `wicket` owns the stateful part of a single-operator admin surface: shared
//! passphrase validation, failed-attempt lockout, an authenticated session
//! with idle timeout and a pre-expiry warning window, activity-driven session
//! extension, and a keyboard-chord entry point. UI hosts render state and
//! forward input; this crate owns the state machine.
//!
//! All collaborators with side effects are injected: a [`Clock`], a
//! [`StateStore`], a [`Scheduler`] and an optional [`ActivityEventSource`].
//! Swap in [`ManualClock`], [`InMemoryStateStore`] and [`ManualScheduler`]
//! for fully deterministic tests.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wicket::{AdminConfig, AdminSessionBuilder, SecretString};
//! use wicket::events::listeners::LoggingListener;
//!
//! let config = AdminConfig {
//!     expected_secret: SecretString::new(std::env::var("ADMIN_SECRET")?),
//!     ..AdminConfig::default()
//! };
//!
//! let session = AdminSessionBuilder::new(config)
//!     .listen(LoggingListener::new())
//!     .build()
//!     .await?;
//!
//! let outcome = session.login("hunter2").await?;
//! println!("{}", outcome.message());
//! ```

pub mod activity;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod events;
pub mod format;
pub mod lockout;
pub mod scheduler;
pub mod secret;
pub mod session;
pub mod shortcut;
pub mod store;
pub mod token;

pub use activity::{
    ActivityEventSource, ActivityKind, ActivitySink, InProcessEventSource, Subscription,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AdminConfig, LockoutConfig, SessionTimingConfig, StorageKeys};
pub use credentials::CredentialValidator;
pub use events::{AdminEvent, Listener};
pub use lockout::{AttemptTracker, FailureOutcome, LockoutRecord};
pub use scheduler::{CancelHandle, ManualScheduler, Scheduler, TokioScheduler};
pub use secret::SecretString;
pub use session::{AdminSession, AdminSessionBuilder, LoginOutcome, SessionRecord, SessionState};
pub use shortcut::{KeyChord, KeyPress, ShortcutAction, ShortcutBinding, ShortcutDispatcher};
pub use store::{FileStateStore, InMemoryStateStore, StateStore};

use std::fmt;

/// Errors surfaced by the session manager.
///
/// Rejected credentials and lockout are *outcomes* (see [`LoginOutcome`]),
/// not errors; a corrupted persisted record is cleared and treated as absent
/// rather than reported. What remains is genuine storage failure and
/// misconfiguration.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminError {
    StorageError(String),
    InvalidConfig(&'static str),
}

impl std::error::Error for AdminError {}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AdminError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}
