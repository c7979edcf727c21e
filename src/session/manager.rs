//! The orchestrating state machine.
//!
//! [`AdminSession`] composes the credential validator, attempt tracker,
//! store, clock, scheduler and activity monitor behind the operation set the
//! UI consumes. Internal state lives behind a `RwLock`; guards are never
//! held across `.await` — state is computed under the lock, then persisted
//! and dispatched after the guard is dropped.

use std::sync::{Arc, RwLock, Weak};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;

use crate::activity::{ActivityEventSource, ActivityKind, ActivityMonitor, ActivitySink};
use crate::clock::{Clock, SystemClock};
use crate::config::AdminConfig;
use crate::credentials::CredentialValidator;
use crate::events::{AdminEvent, EventRegistry, Listener};
use crate::lockout::{AttemptTracker, FailureOutcome};
use crate::scheduler::{CancelHandle, Scheduler, TickTask, TokioScheduler};
use crate::session::{LoginOutcome, SessionRecord, SessionState};
use crate::store::{read_record, write_record, InMemoryStateStore, StateStore};
use crate::token::generate_token;
use crate::AdminError;

fn to_std(duration: Duration) -> StdDuration {
    duration.to_std().unwrap_or(StdDuration::ZERO)
}

fn lock_poisoned() -> AdminError {
    AdminError::StorageError("Lock poisoned".to_owned())
}

/// Builder for [`AdminSession`].
///
/// Collaborators default to production implementations ([`SystemClock`],
/// [`InMemoryStateStore`], [`TokioScheduler`], no activity source); tests
/// inject manual ones.
pub struct AdminSessionBuilder {
    config: AdminConfig,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn StateStore>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    activity_source: Option<Arc<dyn ActivityEventSource>>,
    registry: EventRegistry,
}

impl AdminSessionBuilder {
    #[must_use]
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config,
            clock: None,
            store: None,
            scheduler: None,
            activity_source: None,
            registry: EventRegistry::new(),
        }
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    #[must_use]
    pub fn activity_source(mut self, source: Arc<dyn ActivityEventSource>) -> Self {
        self.activity_source = Some(source);
        self
    }

    /// Registers an event listener. Listeners are called in registration
    /// order and cannot be added after the manager is built.
    #[must_use]
    pub fn listen(mut self, listener: impl Listener) -> Self {
        self.registry.listen(listener);
        self
    }

    /// Validates the configuration, restores persisted state and returns the
    /// manager.
    ///
    /// A fresh-enough persisted session resumes authenticated, with its tick
    /// timer and activity subscription re-armed; a stale or corrupt record
    /// is discarded. A live persisted lockout resumes locked.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidConfig` for configurations the state
    /// machine cannot run with, or a storage error from the restore reads.
    pub async fn build(self) -> Result<Arc<AdminSession>, AdminError> {
        self.config.validate().map_err(AdminError::InvalidConfig)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStateStore::new()));
        let scheduler = self.scheduler.unwrap_or_else(|| Arc::new(TokioScheduler));

        let tracker = AttemptTracker::new(
            self.config.lockout.clone(),
            self.config.storage.lockout.clone(),
            Arc::clone(&clock),
            Arc::clone(&store),
        );
        let monitor = ActivityMonitor::new(self.activity_source, self.config.activity_kinds.clone());
        let validator = CredentialValidator::new(self.config.expected_secret.clone());

        let session = Arc::new(AdminSession {
            config: self.config,
            clock,
            store,
            scheduler,
            validator,
            tracker,
            monitor,
            events: self.registry,
            record: RwLock::new(None),
            ticker: RwLock::new(None),
            countdown: RwLock::new(None),
        });
        session.restore().await?;

        Ok(session)
    }
}

/// The admin session lifecycle manager.
///
/// One instance per admin surface. States: logged out, active, or active
/// with a pending idle warning; see [`SessionState`]. All operations report
/// through return values and dispatched [`AdminEvent`]s — nothing here
/// panics or throws on a wrong passphrase.
pub struct AdminSession {
    config: AdminConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn StateStore>,
    scheduler: Arc<dyn Scheduler>,
    validator: CredentialValidator,
    tracker: AttemptTracker,
    monitor: ActivityMonitor,
    events: EventRegistry,
    record: RwLock<Option<SessionRecord>>,
    ticker: RwLock<Option<CancelHandle>>,
    countdown: RwLock<Option<CancelHandle>>,
}

enum EndReason {
    Manual,
    Expired,
}

enum TickAction {
    Expire,
    Warn { record: SessionRecord, remaining_secs: i64 },
    Nothing,
}

impl AdminSession {
    /// Attempts to authenticate with the shared passphrase.
    ///
    /// An active lockout rejects the attempt without counting it. A wrong
    /// passphrase is counted and may start a lockout. Success clears the
    /// attempt counter, persists a fresh session and arms the idle timer and
    /// activity subscription.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "login", skip_all))]
    pub async fn login(self: &Arc<Self>, secret: &str) -> Result<LoginOutcome, AdminError> {
        if self.tracker.is_locked().await? {
            let remaining = self.tracker.remaining_lockout().await?;
            return Ok(LoginOutcome::Locked {
                retry_after_secs: remaining.num_seconds(),
            });
        }

        if !self.validator.validate(secret) {
            return match self.tracker.record_failure().await? {
                FailureOutcome::Open { attempts_remaining } => {
                    self.events
                        .dispatch(AdminEvent::LoginFailed {
                            attempts_remaining,
                            at: self.clock.now(),
                        })
                        .await;
                    Ok(LoginOutcome::Denied { attempts_remaining })
                }
                FailureOutcome::LockedOut { retry_after_secs } => {
                    let at = self.clock.now();
                    self.events
                        .dispatch(AdminEvent::LoginFailed {
                            attempts_remaining: 0,
                            at,
                        })
                        .await;
                    self.events
                        .dispatch(AdminEvent::LockoutStarted {
                            retry_after_secs,
                            at,
                        })
                        .await;
                    self.start_lockout_countdown()?;
                    Ok(LoginOutcome::Locked { retry_after_secs })
                }
            };
        }

        self.tracker.record_success().await?;

        let now = self.clock.now();
        let record = SessionRecord::new(now, generate_token(32));
        write_record(self.store.as_ref(), &self.config.storage.session, &record).await?;

        *self.record.write().map_err(|_| lock_poisoned())? = Some(record.clone());
        self.arm_session_tasks()?;

        self.events
            .dispatch(AdminEvent::LoginSucceeded {
                session_id: record.session_id.clone(),
                at: now,
            })
            .await;

        Ok(LoginOutcome::Granted {
            session_id: record.session_id,
        })
    }

    /// Ends the session explicitly.
    ///
    /// Idempotent: calling while logged out does nothing and is not an
    /// error.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "logout", skip_all))]
    pub async fn logout(&self) -> Result<(), AdminError> {
        self.end_session(EndReason::Manual).await
    }

    /// Resets the idle clock and clears any pending warning.
    ///
    /// Returns true if a live session was touched. Called by the activity
    /// subscription on every observed event; hosts call
    /// [`extend_session`](Self::extend_session) instead.
    pub async fn touch(&self) -> Result<bool, AdminError> {
        let now = self.clock.now();
        let session_duration = self.config.timing.session_duration;

        let updated = {
            let mut guard = self.record.write().map_err(|_| lock_poisoned())?;
            match guard.as_mut() {
                // a record past its idle limit is the tick's business, not ours
                Some(record) if !record.is_expired(now, session_duration) => {
                    record.last_activity = now;
                    record.warning_shown = false;
                    Some(record.clone())
                }
                _ => None,
            }
        };

        match updated {
            Some(record) => {
                write_record(self.store.as_ref(), &self.config.storage.session, &record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Explicit "keep me signed in" from the warning dialog.
    ///
    /// Same effect as an activity event, plus a `SessionExtended` event so
    /// the UI can close the warning.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "extend_session", skip_all))]
    pub async fn extend_session(&self) -> Result<(), AdminError> {
        if self.touch().await? {
            self.events
                .dispatch(AdminEvent::SessionExtended {
                    at: self.clock.now(),
                })
                .await;
        }
        Ok(())
    }

    /// One evaluation of the expiry/warning conditions.
    ///
    /// Driven by the scheduler while authenticated; also callable directly.
    /// The expiry check runs strictly before the warning check, so a tick
    /// that crosses both thresholds logs out rather than warning.
    pub async fn tick(&self) -> Result<(), AdminError> {
        let now = self.clock.now();
        let session_duration = self.config.timing.session_duration;
        let warning_lead_time = self.config.timing.warning_lead_time;

        let action = {
            let mut guard = self.record.write().map_err(|_| lock_poisoned())?;
            match guard.as_mut() {
                None => TickAction::Nothing,
                Some(record) => {
                    let idle = record.idle(now);
                    if idle >= session_duration {
                        TickAction::Expire
                    } else if idle >= session_duration - warning_lead_time
                        && !record.warning_shown
                    {
                        record.warning_shown = true;
                        TickAction::Warn {
                            record: record.clone(),
                            remaining_secs: (session_duration - idle).num_seconds(),
                        }
                    } else {
                        TickAction::Nothing
                    }
                }
            }
        };

        match action {
            TickAction::Expire => self.end_session(EndReason::Expired).await,
            TickAction::Warn {
                record,
                remaining_secs,
            } => {
                write_record(self.store.as_ref(), &self.config.storage.session, &record).await?;
                self.events
                    .dispatch(AdminEvent::SessionWarning {
                        remaining_secs,
                        at: now,
                    })
                    .await;
                Ok(())
            }
            TickAction::Nothing => Ok(()),
        }
    }

    /// Asks the UI to show the login surface.
    ///
    /// Dispatched by the shortcut dispatcher; hosts may also call it
    /// directly (e.g. from a hidden route).
    pub async fn request_login_prompt(&self) {
        self.events
            .dispatch(AdminEvent::LoginPromptRequested {
                at: self.clock.now(),
            })
            .await;
    }

    /// True while a live, unexpired session exists.
    pub fn is_authenticated(&self) -> bool {
        let now = self.clock.now();
        self.record
            .read()
            .map(|guard| {
                guard
                    .as_ref()
                    .is_some_and(|r| !r.is_expired(now, self.config.timing.session_duration))
            })
            .unwrap_or(false)
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        let now = self.clock.now();
        self.record
            .read()
            .map(|guard| match guard.as_ref() {
                Some(r) if r.is_expired(now, self.config.timing.session_duration) => {
                    SessionState::LoggedOut
                }
                Some(r) if r.warning_shown => SessionState::WarningPending,
                Some(_) => SessionState::Active,
                None => SessionState::LoggedOut,
            })
            .unwrap_or(SessionState::LoggedOut)
    }

    /// Idle time left before expiry, zero while logged out.
    pub fn time_remaining(&self) -> Duration {
        let now = self.clock.now();
        self.record
            .read()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|r| (self.config.timing.session_duration - r.idle(now)).max(Duration::zero()))
            })
            .unwrap_or_else(Duration::zero)
    }

    /// The display/audit id of the live session, if any.
    pub fn session_id(&self) -> Option<String> {
        self.record
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|r| r.session_id.clone()))
    }

    /// Whether a lockout is currently active.
    pub async fn is_locked(&self) -> Result<bool, AdminError> {
        self.tracker.is_locked().await
    }

    /// Time left on the active lockout, zero when unlocked.
    pub async fn lockout_time_remaining(&self) -> Result<Duration, AdminError> {
        self.tracker.remaining_lockout().await
    }

    /// Failed attempts in the current window.
    pub fn attempts_used(&self) -> u32 {
        self.tracker.attempts_used()
    }

    /// The configured attempt ceiling.
    pub fn max_attempts(&self) -> u32 {
        self.config.lockout.max_attempts
    }

    /// The configuration the manager was built with.
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub(crate) fn clock_handle(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Releases timers and the activity subscription without ending the
    /// persisted session.
    ///
    /// Use at host teardown; the session is picked up again by the next
    /// [`AdminSessionBuilder::build`] over the same store.
    pub fn shutdown(&self) {
        self.disarm_session_tasks();
        self.stop_lockout_countdown();
    }

    async fn restore(self: &Arc<Self>) -> Result<(), AdminError> {
        self.tracker.sync().await?;
        if self.tracker.is_locked().await? {
            self.start_lockout_countdown()?;
        }

        let Some(record) =
            read_record::<SessionRecord>(self.store.as_ref(), &self.config.storage.session).await?
        else {
            return Ok(());
        };

        let now = self.clock.now();
        if !record.is_authenticated
            || record.is_expired(now, self.config.timing.session_duration)
        {
            log::debug!(target: "wicket::session", "discarding stale session record");
            self.store.delete(&self.config.storage.session).await?;
            return Ok(());
        }

        *self.record.write().map_err(|_| lock_poisoned())? = Some(record);
        self.arm_session_tasks()?;
        Ok(())
    }

    async fn end_session(&self, reason: EndReason) -> Result<(), AdminError> {
        let had_session = {
            let mut guard = self.record.write().map_err(|_| lock_poisoned())?;
            guard.take().is_some()
        };
        if !had_session {
            return Ok(());
        }

        self.disarm_session_tasks();
        self.store.delete(&self.config.storage.session).await?;

        let at = self.clock.now();
        self.events
            .dispatch(match reason {
                EndReason::Manual => AdminEvent::LoggedOut { at },
                EndReason::Expired => AdminEvent::SessionExpired { at },
            })
            .await;
        Ok(())
    }

    /// Starts the tick timer and activity subscription for the current
    /// session. Both are armed at most once; re-arming while armed is a
    /// no-op.
    fn arm_session_tasks(self: &Arc<Self>) -> Result<(), AdminError> {
        {
            let mut ticker = self.ticker.write().map_err(|_| lock_poisoned())?;
            if ticker.is_none() {
                let weak = Arc::downgrade(self);
                let task: TickTask = Arc::new(move || {
                    let weak = weak.clone();
                    Box::pin(async move {
                        if let Some(session) = weak.upgrade() {
                            if let Err(err) = session.tick().await {
                                log::warn!(target: "wicket::session", "tick failed: {err}");
                            }
                        }
                    })
                });
                *ticker = Some(self.scheduler.every(
                    to_std(self.config.timing.activity_check_interval),
                    task,
                ));
            }
        }

        self.monitor.attach(Arc::new(TouchSink {
            session: Arc::downgrade(self),
        }));
        Ok(())
    }

    fn disarm_session_tasks(&self) {
        if let Ok(mut ticker) = self.ticker.write() {
            if let Some(handle) = ticker.take() {
                handle.cancel();
            }
        }
        self.monitor.detach();
    }

    /// Starts the display-only lockout countdown timer. Armed at most once.
    fn start_lockout_countdown(self: &Arc<Self>) -> Result<(), AdminError> {
        let mut slot = self.countdown.write().map_err(|_| lock_poisoned())?;
        if slot.is_some() {
            return Ok(());
        }

        let weak = Arc::downgrade(self);
        let task: TickTask = Arc::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(session) = weak.upgrade() {
                    session.lockout_countdown_tick().await;
                }
            })
        });
        *slot = Some(self.scheduler.every(
            to_std(self.config.lockout.countdown_refresh_interval),
            task,
        ));
        Ok(())
    }

    fn stop_lockout_countdown(&self) {
        if let Ok(mut slot) = self.countdown.write() {
            if let Some(handle) = slot.take() {
                handle.cancel();
            }
        }
    }

    /// One refresh of the lockout display. No session state changes here;
    /// the tracker's own read heals an expired lockout.
    async fn lockout_countdown_tick(&self) {
        let at = self.clock.now();
        match self.tracker.is_locked().await {
            Ok(true) => {
                if let Ok(remaining) = self.tracker.remaining_lockout().await {
                    self.events
                        .dispatch(AdminEvent::LockoutCountdown {
                            remaining_secs: remaining.num_seconds(),
                            at,
                        })
                        .await;
                }
            }
            Ok(false) => {
                self.stop_lockout_countdown();
                self.events.dispatch(AdminEvent::LockoutEnded { at }).await;
            }
            Err(err) => {
                log::warn!(target: "wicket::session", "lockout countdown check failed: {err}");
            }
        }
    }
}

/// Forwards observed activity into [`AdminSession::touch`].
struct TouchSink {
    session: Weak<AdminSession>,
}

#[async_trait]
impl ActivitySink for TouchSink {
    async fn on_activity(&self, _kind: ActivityKind) {
        if let Some(session) = self.session.upgrade() {
            if let Err(err) = session.touch().await {
                log::warn!(target: "wicket::session", "failed to record activity: {err}");
            }
        }
    }
}
