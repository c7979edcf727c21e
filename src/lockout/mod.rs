//! Failed-attempt tracking and lockout.
//!
//! The tracker is a two-state machine, **Open** and **Locked**. Failures
//! accumulate in memory; reaching the configured threshold persists a
//! [`LockoutRecord`] and locks the tracker. Expiry is self-healing: any read
//! that finds an expired record deletes it and reopens the tracker, so no
//! timer is needed for correctness (the countdown timer is display-only).
//!
//! Only the lockout record is persisted. Attempt counts below the threshold
//! live in memory and reset on process restart; a live record found after a
//! restart repopulates the counter, so lockout itself survives reloads.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::LockoutConfig;
use crate::store::{read_record, write_record, StateStore};
use crate::AdminError;

/// Persisted record of an active lockout.
///
/// Timestamps are serialized as int64 milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockoutRecord {
    /// Time of the failed attempt that triggered the lockout.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Failure count at lockout time, `>= max_attempts`.
    pub attempts: u32,
}

/// Outcome of recording a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Still open; `attempts_remaining` failures left before lockout.
    Open { attempts_remaining: u32 },
    /// This failure crossed the threshold and started a lockout.
    LockedOut { retry_after_secs: i64 },
}

/// Counts failed login attempts and owns the lockout lifecycle.
pub struct AttemptTracker {
    config: LockoutConfig,
    storage_key: String,
    clock: Arc<dyn Clock>,
    store: Arc<dyn StateStore>,
    attempts: AtomicU32,
}

impl AttemptTracker {
    pub fn new(
        config: LockoutConfig,
        storage_key: impl Into<String>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            config,
            storage_key: storage_key.into(),
            clock,
            store,
            attempts: AtomicU32::new(0),
        }
    }

    /// Reads the persisted record, healing an expired lockout.
    ///
    /// A live record also restores the in-memory counter, which covers the
    /// reload-while-locked case.
    async fn load_active_record(&self) -> Result<Option<LockoutRecord>, AdminError> {
        let Some(record) =
            read_record::<LockoutRecord>(self.store.as_ref(), &self.storage_key).await?
        else {
            return Ok(None);
        };

        if self.clock.now() - record.timestamp >= self.config.lockout_duration {
            self.store.delete(&self.storage_key).await?;
            self.attempts.store(0, Ordering::SeqCst);
            return Ok(None);
        }

        if record.attempts > self.attempts.load(Ordering::SeqCst) {
            self.attempts.store(record.attempts, Ordering::SeqCst);
        }
        Ok(Some(record))
    }

    /// Syncs the in-memory counter with any persisted lockout.
    ///
    /// Called once at manager restore; every other read is lazy.
    pub async fn sync(&self) -> Result<(), AdminError> {
        self.load_active_record().await.map(|_| ())
    }

    /// Records a failed attempt.
    ///
    /// Reaching `max_attempts` persists a [`LockoutRecord`] stamped with the
    /// current time and reports the lockout.
    pub async fn record_failure(&self) -> Result<FailureOutcome, AdminError> {
        let used = self.attempts.fetch_add(1, Ordering::SeqCst).saturating_add(1);

        if used >= self.config.max_attempts {
            let record = LockoutRecord {
                timestamp: self.clock.now(),
                attempts: used,
            };
            write_record(self.store.as_ref(), &self.storage_key, &record).await?;

            Ok(FailureOutcome::LockedOut {
                retry_after_secs: self.config.lockout_duration.num_seconds(),
            })
        } else {
            Ok(FailureOutcome::Open {
                attempts_remaining: self.config.max_attempts - used,
            })
        }
    }

    /// Clears the counter and any persisted lockout.
    pub async fn record_success(&self) -> Result<(), AdminError> {
        self.attempts.store(0, Ordering::SeqCst);
        self.store.delete(&self.storage_key).await
    }

    /// Returns whether an unexpired lockout is active.
    ///
    /// Finding an expired record deletes it and resets the counter
    /// (**Locked → Open** without any external trigger).
    pub async fn is_locked(&self) -> Result<bool, AdminError> {
        Ok(self.load_active_record().await?.is_some())
    }

    /// Time left until the lockout expires, zero when not locked.
    pub async fn remaining_lockout(&self) -> Result<Duration, AdminError> {
        match self.load_active_record().await? {
            Some(record) => {
                let remaining =
                    self.config.lockout_duration - (self.clock.now() - record.timestamp);
                Ok(remaining.max(Duration::zero()))
            }
            None => Ok(Duration::zero()),
        }
    }

    /// Failed attempts recorded in the current window.
    pub fn attempts_used(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The configured attempt ceiling.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}
