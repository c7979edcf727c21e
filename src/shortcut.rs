//! Global keyboard entry point.
//!
//! A [`ShortcutDispatcher`] watches the host's key events for the configured
//! binding. On a match it either requests the login surface (logged out,
//! not locked) or logs out (authenticated). The binding is configuration,
//! not behavior: a single modifier chord, or a chord followed by a second
//! plain key within a short arming window.
//!
//! The key model is deliberately transport-agnostic — hosts map whatever
//! their input layer produces (DOM `KeyboardEvent`, crossterm `KeyEvent`,
//! a toolkit accelerator) into [`KeyPress`] values and feed them to
//! [`handle_key`](ShortcutDispatcher::handle_key).

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::session::AdminSession;
use crate::AdminError;

/// A single observed key press with modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: char,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyPress {
    /// A key press with no modifiers held.
    #[must_use]
    pub fn plain(key: char) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    fn is_plain(&self, key: char) -> bool {
        !self.ctrl && !self.alt && self.key.eq_ignore_ascii_case(&key)
    }
}

/// A key plus the exact modifier set that must be held.
///
/// Key comparison ignores ASCII case so that a held Shift does not change
/// which letter the chord sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: char,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyChord {
    #[must_use]
    pub fn new(key: char) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    #[must_use]
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    #[must_use]
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// True if `press` is exactly this chord.
    pub fn matches(&self, press: &KeyPress) -> bool {
        press.ctrl == self.ctrl
            && press.alt == self.alt
            && press.shift == self.shift
            && press.key.eq_ignore_ascii_case(&self.key)
    }
}

/// The configured entry-point binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutBinding {
    /// A single chord, e.g. Ctrl+Alt+Shift+A.
    Chord(KeyChord),
    /// A chord that arms a short window in which a second plain key
    /// completes the shortcut, e.g. Ctrl+Shift+A then D within 2 seconds.
    /// The window is checked against the manager's clock on the next key;
    /// no second listener outlives it.
    Sequence {
        first: KeyChord,
        second: char,
        window: Duration,
    },
}

impl Default for ShortcutBinding {
    fn default() -> Self {
        Self::Chord(KeyChord::new('a').ctrl().alt().shift())
    }
}

/// What a matched shortcut did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// The login surface was requested (a `LoginPromptRequested` event was
    /// dispatched).
    ShowLogin,
    /// The authenticated session was logged out.
    LoggedOut,
}

/// Matches key events against the binding and drives the manager.
pub struct ShortcutDispatcher {
    session: Arc<AdminSession>,
    binding: ShortcutBinding,
    clock: Arc<dyn Clock>,
    armed_at: RwLock<Option<DateTime<Utc>>>,
}

impl ShortcutDispatcher {
    /// Creates a dispatcher using the binding from the manager's config.
    #[must_use]
    pub fn new(session: Arc<AdminSession>) -> Self {
        let binding = session.config().shortcut.clone();
        Self::with_binding(session, binding)
    }

    /// Creates a dispatcher with an explicit binding.
    #[must_use]
    pub fn with_binding(session: Arc<AdminSession>, binding: ShortcutBinding) -> Self {
        let clock = session.clock_handle();
        Self {
            session,
            binding,
            clock,
            armed_at: RwLock::new(None),
        }
    }

    /// Feeds one observed key press through the binding.
    ///
    /// Returns what the shortcut did, or `None` when the press did not
    /// complete the binding (including while locked out).
    pub async fn handle_key(&self, press: KeyPress) -> Result<Option<ShortcutAction>, AdminError> {
        match &self.binding {
            ShortcutBinding::Chord(chord) => {
                if chord.matches(&press) {
                    self.trigger().await
                } else {
                    Ok(None)
                }
            }
            ShortcutBinding::Sequence {
                first,
                second,
                window,
            } => {
                let now = self.clock.now();

                // any key disarms; a matching first key re-arms below
                let armed_at = self
                    .armed_at
                    .write()
                    .map_err(|_| AdminError::StorageError("Lock poisoned".to_owned()))?
                    .take();

                if let Some(armed_at) = armed_at {
                    if now - armed_at <= *window && press.is_plain(*second) {
                        return self.trigger().await;
                    }
                }

                if first.matches(&press) {
                    *self
                        .armed_at
                        .write()
                        .map_err(|_| AdminError::StorageError("Lock poisoned".to_owned()))? =
                        Some(now);
                }
                Ok(None)
            }
        }
    }

    /// True while a sequence binding is waiting for its second key.
    pub fn is_armed(&self) -> bool {
        self.armed_at
            .read()
            .map(|armed| armed.is_some())
            .unwrap_or(false)
    }

    async fn trigger(&self) -> Result<Option<ShortcutAction>, AdminError> {
        if self.session.is_authenticated() {
            self.session.logout().await?;
            return Ok(Some(ShortcutAction::LoggedOut));
        }

        if self.session.is_locked().await? {
            return Ok(None);
        }

        self.session.request_login_prompt().await;
        Ok(Some(ShortcutAction::ShowLogin))
    }
}
