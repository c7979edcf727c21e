//! User-presence detection.
//!
//! The manager does not watch input devices itself. A host adapts whatever
//! it has (DOM events, terminal input, a windowing toolkit) into an
//! [`ActivityEventSource`]; the manager subscribes a sink while a session is
//! authenticated and every observed event resets the idle clock.
//!
//! Subscription discipline matters: exactly one subscription per
//! authenticated session, torn down exactly once on logout or teardown. The
//! [`Subscription`] guard unsubscribes when cancelled or dropped, so a leak
//! requires deliberately forgetting the guard.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;

/// Kinds of observed events that count as user presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    PointerMove,
    PointerDown,
    KeyDown,
    Scroll,
    Touch,
}

impl ActivityKind {
    /// Every kind, the default presence set.
    pub const fn all() -> [ActivityKind; 5] {
        [
            ActivityKind::PointerMove,
            ActivityKind::PointerDown,
            ActivityKind::KeyDown,
            ActivityKind::Scroll,
            ActivityKind::Touch,
        ]
    }
}

/// Receives observed activity events.
#[async_trait]
pub trait ActivitySink: Send + Sync + 'static {
    async fn on_activity(&self, kind: ActivityKind);
}

/// A source of user-presence events the manager can subscribe to.
///
/// Implementations deliver each observed event of a subscribed kind to the
/// sink, and stop delivering once the returned [`Subscription`] is cancelled
/// or dropped.
pub trait ActivityEventSource: Send + Sync {
    fn subscribe(&self, kinds: &[ActivityKind], sink: Arc<dyn ActivitySink>) -> Subscription;
}

/// Guard for an active subscription.
///
/// Unsubscribes on [`cancel`](Self::cancel) or on drop, whichever comes
/// first.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wraps an unsubscribe closure. Implementors of
    /// [`ActivityEventSource`] call this; consumers only hold the guard.
    #[must_use]
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Unsubscribes now instead of at drop time.
    pub fn cancel(mut self) {
        self.run_unsubscribe();
    }

    fn run_unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// An in-process [`ActivityEventSource`].
///
/// Hosts push events in with [`emit`](Self::emit); subscribed sinks receive
/// the kinds they asked for. Cloning shares the subscriber table.
///
/// # Example
///
/// ```rust,ignore
/// let source = InProcessEventSource::new();
/// let session = AdminSessionBuilder::new(config)
///     .activity_source(Arc::new(source.clone()))
///     .build()
///     .await?;
///
/// // host input loop:
/// source.emit(ActivityKind::KeyDown).await;
/// ```
#[derive(Clone, Default)]
pub struct InProcessEventSource {
    inner: Arc<SourceInner>,
}

#[derive(Default)]
struct SourceInner {
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
}

struct Subscriber {
    kinds: Vec<ActivityKind>,
    sink: Arc<dyn ActivitySink>,
}

impl InProcessEventSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an event to every subscriber registered for its kind.
    pub async fn emit(&self, kind: ActivityKind) {
        let sinks: Vec<Arc<dyn ActivitySink>> = self
            .inner
            .subscribers
            .read()
            .map(|subscribers| {
                subscribers
                    .values()
                    .filter(|s| s.kinds.contains(&kind))
                    .map(|s| Arc::clone(&s.sink))
                    .collect()
            })
            .unwrap_or_default();

        for sink in sinks {
            sink.on_activity(kind).await;
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

impl ActivityEventSource for InProcessEventSource {
    fn subscribe(&self, kinds: &[ActivityKind], sink: Arc<dyn ActivitySink>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);

        if let Ok(mut subscribers) = self.inner.subscribers.write() {
            subscribers.insert(
                id,
                Subscriber {
                    kinds: kinds.to_vec(),
                    sink,
                },
            );
        }

        let weak: Weak<SourceInner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut subscribers) = inner.subscribers.write() {
                    subscribers.remove(&id);
                }
            }
        })
    }
}

/// Owns the manager's one-per-session subscription.
pub(crate) struct ActivityMonitor {
    source: Option<Arc<dyn ActivityEventSource>>,
    kinds: Vec<ActivityKind>,
    subscription: RwLock<Option<Subscription>>,
}

impl ActivityMonitor {
    pub(crate) fn new(
        source: Option<Arc<dyn ActivityEventSource>>,
        kinds: Vec<ActivityKind>,
    ) -> Self {
        Self {
            source,
            kinds,
            subscription: RwLock::new(None),
        }
    }

    /// Subscribes `sink`. Returns false if no source is configured or a
    /// subscription is already live (never double-subscribes).
    pub(crate) fn attach(&self, sink: Arc<dyn ActivitySink>) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        let Ok(mut slot) = self.subscription.write() else {
            return false;
        };
        if slot.is_some() {
            return false;
        }

        *slot = Some(source.subscribe(&self.kinds, sink));
        true
    }

    /// Cancels the live subscription, if any. Safe to call repeatedly.
    pub(crate) fn detach(&self) {
        if let Ok(mut slot) = self.subscription.write() {
            if let Some(subscription) = slot.take() {
                subscription.cancel();
            }
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.subscription
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}
