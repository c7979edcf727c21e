//! Repeating-timer seam.
//!
//! The manager never installs timers directly; it asks an injected
//! [`Scheduler`] for a repeating task and retains the returned
//! [`CancelHandle`], cancelling it when the state that required the timer is
//! left. A tick always runs to completion (including any persisted write)
//! before the next one is scheduled; cancellation is observed between ticks,
//! never mid-tick.
//!
//! [`TokioScheduler`] drives tasks off the tokio runtime. [`ManualScheduler`]
//! records tasks and fires them only when a test says so.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::Notify;

/// A repeating task run by a [`Scheduler`].
pub type TickTask = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Schedules repeating work.
pub trait Scheduler: Send + Sync {
    /// Runs `task` every `period` until the returned handle is cancelled.
    ///
    /// The first invocation happens one full `period` after this call.
    fn every(&self, period: Duration, task: TickTask) -> CancelHandle;
}

/// Cancels a scheduled task.
///
/// Cancelling is idempotent. Dropping the handle cancels the task, so a
/// leaked timer requires deliberately holding the handle somewhere.
#[derive(Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Stops the task. A tick already in flight runs to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called (or the
    /// handle dropped).
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Scheduler backed by the tokio runtime.
///
/// Requires a running runtime at the time [`every`](Scheduler::every) is
/// called. Missed ticks are delayed, not bursted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, task: TickTask) -> CancelHandle {
        let handle = CancelHandle::new();
        let cancelled = Arc::clone(&handle.cancelled);
        let notify = Arc::clone(&handle.notify);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick of a tokio interval resolves immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = notify.notified() => break,
                    _ = interval.tick() => {
                        if cancelled.load(Ordering::SeqCst) {
                            break;
                        }
                        task().await;
                    }
                }
            }
        });

        handle
    }
}

/// Scheduler that fires only when told to.
///
/// Registered tasks are run by [`fire_all`](Self::fire_all), letting tests
/// interleave ticks with [`ManualClock`](crate::ManualClock) advances.
/// Cloning shares the task list.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tasks: Arc<RwLock<Vec<ManualTask>>>,
}

struct ManualTask {
    period: Duration,
    task: TickTask,
    cancelled: Arc<AtomicBool>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every live task once, in registration order.
    ///
    /// Cancelled tasks are purged, never run. A task cancelling its own
    /// handle mid-run finishes that run and is purged afterwards.
    pub async fn fire_all(&self) {
        let live: Vec<(TickTask, Arc<AtomicBool>)> = {
            let mut tasks = match self.tasks.write() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            tasks.retain(|t| !t.cancelled.load(Ordering::SeqCst));
            tasks
                .iter()
                .map(|t| (Arc::clone(&t.task), Arc::clone(&t.cancelled)))
                .collect()
        };

        for (task, cancelled) in live {
            if !cancelled.load(Ordering::SeqCst) {
                task().await;
            }
        }
    }

    /// Number of registered, not-yet-cancelled tasks.
    pub fn live_task_count(&self) -> usize {
        self.tasks
            .read()
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|t| !t.cancelled.load(Ordering::SeqCst))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Periods of the live tasks, in registration order.
    pub fn live_periods(&self) -> Vec<Duration> {
        self.tasks
            .read()
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|t| !t.cancelled.load(Ordering::SeqCst))
                    .map(|t| t.period)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, task: TickTask) -> CancelHandle {
        let handle = CancelHandle::new();

        if let Ok(mut tasks) = self.tasks.write() {
            tasks.push(ManualTask {
                period,
                task,
                cancelled: Arc::clone(&handle.cancelled),
            });
        }

        handle
    }
}
