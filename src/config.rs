//! Configuration types for the admin session manager.
//!
//! Everything time- or threshold-dependent is supplied here at construction;
//! nothing is hard-coded in the state machine. Durations use
//! `chrono::Duration` throughout.
//!
//! # Example
//!
//! ```rust
//! use wicket::{AdminConfig, LockoutConfig, SecretString, SessionTimingConfig};
//! use chrono::Duration;
//!
//! // Defaults: 30 min session, warning 5 min before expiry,
//! // 5 attempts, 15 min lockout.
//! let config = AdminConfig {
//!     expected_secret: SecretString::new("a-long-shared-passphrase"),
//!     ..AdminConfig::default()
//! };
//!
//! // Or customize
//! let config = AdminConfig {
//!     expected_secret: SecretString::new("a-long-shared-passphrase"),
//!     timing: SessionTimingConfig {
//!         session_duration: Duration::minutes(10),
//!         warning_lead_time: Duration::minutes(2),
//!         ..Default::default()
//!     },
//!     lockout: LockoutConfig::disabled(),
//!     ..AdminConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use chrono::Duration;

use crate::activity::ActivityKind;
use crate::secret::SecretString;
use crate::shortcut::ShortcutBinding;

/// Main configuration for the admin session manager.
///
/// Use the [`Default`] instance for the reference timings and override the
/// secret; the struct is immutable once the manager is built.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The shared admin passphrase to compare login attempts against.
    pub expected_secret: SecretString,

    /// Idle-timeout and warning timings.
    pub timing: SessionTimingConfig,

    /// Failed-attempt lockout settings.
    pub lockout: LockoutConfig,

    /// Key chord (or chord-then-key sequence) that opens the login surface
    /// or logs out.
    pub shortcut: ShortcutBinding,

    /// Store keys for the session and lockout records.
    pub storage: StorageKeys,

    /// Which observed event kinds count as user presence.
    pub activity_kinds: Vec<ActivityKind>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            expected_secret: SecretString::new(""),
            timing: SessionTimingConfig::default(),
            lockout: LockoutConfig::default(),
            shortcut: ShortcutBinding::default(),
            storage: StorageKeys::default(),
            activity_kinds: ActivityKind::all().to_vec(),
        }
    }
}

impl AdminConfig {
    /// Creates a configuration with the reference defaults and the given
    /// secret.
    pub fn new(expected_secret: impl Into<SecretString>) -> Self {
        Self {
            expected_secret: expected_secret.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration suitable for development.
    ///
    /// Long sessions, lenient lockout.
    pub fn development(expected_secret: impl Into<SecretString>) -> Self {
        Self {
            expected_secret: expected_secret.into(),
            timing: SessionTimingConfig {
                session_duration: Duration::hours(8),
                warning_lead_time: Duration::minutes(5),
                activity_check_interval: Duration::seconds(60),
            },
            lockout: LockoutConfig {
                max_attempts: 10,
                lockout_duration: Duration::minutes(1),
                countdown_refresh_interval: Duration::seconds(1),
            },
            ..Self::default()
        }
    }

    /// Creates a configuration with stricter settings.
    ///
    /// Short sessions, few attempts, long lockout.
    pub fn strict(expected_secret: impl Into<SecretString>) -> Self {
        Self {
            expected_secret: expected_secret.into(),
            timing: SessionTimingConfig {
                session_duration: Duration::minutes(10),
                warning_lead_time: Duration::minutes(2),
                activity_check_interval: Duration::seconds(30),
            },
            lockout: LockoutConfig {
                max_attempts: 3,
                lockout_duration: Duration::minutes(30),
                countdown_refresh_interval: Duration::seconds(1),
            },
            ..Self::default()
        }
    }

    /// Checks the configuration for values the state machine cannot run with.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.expected_secret.is_empty() {
            return Err("expected_secret must not be empty");
        }
        if self.timing.session_duration <= Duration::zero() {
            return Err("session_duration must be positive");
        }
        if self.timing.warning_lead_time < Duration::zero() {
            return Err("warning_lead_time must not be negative");
        }
        if self.timing.warning_lead_time >= self.timing.session_duration {
            return Err("warning_lead_time must be shorter than session_duration");
        }
        if self.timing.activity_check_interval <= Duration::zero() {
            return Err("activity_check_interval must be positive");
        }
        if self.lockout.max_attempts == 0 {
            return Err("max_attempts must be at least 1");
        }
        if self.lockout.lockout_duration <= Duration::zero() {
            return Err("lockout_duration must be positive");
        }
        if self.lockout.countdown_refresh_interval <= Duration::zero() {
            return Err("countdown_refresh_interval must be positive");
        }
        Ok(())
    }
}

/// Idle-timeout and warning timings.
#[derive(Debug, Clone)]
pub struct SessionTimingConfig {
    /// How long a session may sit idle before it expires.
    ///
    /// Default: 30 minutes
    pub session_duration: Duration,

    /// How long before expiry the idle warning fires.
    ///
    /// Default: 5 minutes (warning at 25 minutes idle)
    pub warning_lead_time: Duration,

    /// How often the expiry/warning conditions are evaluated.
    ///
    /// Default: 60 seconds
    pub activity_check_interval: Duration,
}

impl Default for SessionTimingConfig {
    fn default() -> Self {
        Self {
            session_duration: Duration::minutes(30),
            warning_lead_time: Duration::minutes(5),
            activity_check_interval: Duration::seconds(60),
        }
    }
}

/// Failed-attempt lockout settings.
///
/// Controls how the manager handles repeated failed login attempts to slow
/// down brute-force guessing of the shared passphrase.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failed attempts before lockout.
    ///
    /// Default: 5
    pub max_attempts: u32,

    /// Duration of the lockout after exceeding `max_attempts`.
    ///
    /// Default: 15 minutes
    pub lockout_duration: Duration,

    /// How often the display-only lockout countdown event fires.
    ///
    /// Default: 1 second
    pub countdown_refresh_interval: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::minutes(15),
            countdown_refresh_interval: Duration::seconds(1),
        }
    }
}

impl LockoutConfig {
    /// A configuration that never locks out.
    ///
    /// Failed attempts are still counted and reported.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: u32::MAX,
            ..Self::default()
        }
    }

    /// Returns true if lockout can never trigger.
    pub fn is_disabled(&self) -> bool {
        self.max_attempts == u32::MAX
    }
}

/// Store keys for the persisted records.
#[derive(Debug, Clone)]
pub struct StorageKeys {
    /// Key of the active-session record.
    pub session: String,

    /// Key of the lockout record.
    pub lockout: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            session: "admin_session".to_owned(),
            lockout: "admin_lockout".to_owned(),
        }
    }
}
