//! End-to-end session lifecycle suite.
//!
//! Drives the manager with a manual clock and scheduler. Timings follow the
//! reference defaults: 30 minute session, warning 5 minutes before expiry.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use wicket::events::{AdminEvent, Listener};
use wicket::{
    ActivityKind, AdminConfig, AdminSession, AdminSessionBuilder, InMemoryStateStore,
    InProcessEventSource, ManualClock, ManualScheduler, SessionState, StateStore,
};

const SECRET: &str = "correct horse battery staple";

#[derive(Clone, Default)]
struct RecordingListener {
    events: Arc<Mutex<Vec<AdminEvent>>>,
}

impl RecordingListener {
    fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(AdminEvent::name).collect()
    }

    fn count_of(&self, name: &str) -> usize {
        self.names().iter().filter(|n| **n == name).count()
    }
}

#[async_trait]
impl Listener for RecordingListener {
    async fn handle(&self, event: &AdminEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct Harness {
    session: Arc<AdminSession>,
    clock: ManualClock,
    scheduler: ManualScheduler,
    store: InMemoryStateStore,
    source: InProcessEventSource,
    events: RecordingListener,
}

async fn harness() -> Harness {
    let clock = ManualClock::starting_now();
    let scheduler = ManualScheduler::new();
    let store = InMemoryStateStore::new();
    let source = InProcessEventSource::new();
    let events = RecordingListener::default();

    let session = AdminSessionBuilder::new(AdminConfig::new(SECRET))
        .clock(Arc::new(clock.clone()))
        .store(Arc::new(store.clone()))
        .scheduler(Arc::new(scheduler.clone()))
        .activity_source(Arc::new(source.clone()))
        .listen(events.clone())
        .build()
        .await
        .unwrap();

    Harness {
        session,
        clock,
        scheduler,
        store,
        source,
        events,
    }
}

/// Rebuilds a manager over the same clock and store, simulating a reload.
async fn reload(h: &Harness) -> (Arc<AdminSession>, ManualScheduler, RecordingListener) {
    let scheduler = ManualScheduler::new();
    let events = RecordingListener::default();
    let session = AdminSessionBuilder::new(AdminConfig::new(SECRET))
        .clock(Arc::new(h.clock.clone()))
        .store(Arc::new(h.store.clone()))
        .scheduler(Arc::new(scheduler.clone()))
        .listen(events.clone())
        .build()
        .await
        .unwrap();
    (session, scheduler, events)
}

#[tokio::test]
async fn warning_fires_exactly_once_at_the_threshold() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.clock.advance(Duration::minutes(24) + Duration::seconds(59));
    h.scheduler.fire_all().await;
    assert_eq!(h.events.count_of("admin.session.warning"), 0);
    assert_eq!(h.session.state(), SessionState::Active);

    h.clock.advance(Duration::seconds(1));
    h.scheduler.fire_all().await;
    assert_eq!(h.events.count_of("admin.session.warning"), 1);
    assert_eq!(h.session.state(), SessionState::WarningPending);
    assert!(h.session.is_authenticated());

    // further ticks in the same activity window stay silent
    h.clock.advance(Duration::minutes(1));
    h.scheduler.fire_all().await;
    h.scheduler.fire_all().await;
    assert_eq!(h.events.count_of("admin.session.warning"), 1);
}

#[tokio::test]
async fn warning_event_carries_time_remaining() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.clock.advance(Duration::minutes(26));
    h.scheduler.fire_all().await;

    let events = h.events.events.lock().unwrap().clone();
    let warning = events
        .iter()
        .find(|e| e.name() == "admin.session.warning")
        .unwrap();
    let AdminEvent::SessionWarning { remaining_secs, .. } = warning else {
        panic!("wrong variant");
    };
    assert_eq!(*remaining_secs, 4 * 60);
}

#[tokio::test]
async fn expiry_logs_out_even_without_a_warning_tick() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    // no tick lands between login and well past expiry
    h.clock.advance(Duration::minutes(45));
    h.scheduler.fire_all().await;

    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.state(), SessionState::LoggedOut);
    assert_eq!(h.events.count_of("admin.session.warning"), 0);
    assert_eq!(h.events.count_of("admin.session.expired"), 1);
    assert!(h.store.read("admin_session").await.unwrap().is_none());
}

#[tokio::test]
async fn tick_crossing_both_thresholds_prefers_expiry() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.clock.advance(Duration::minutes(30));
    h.scheduler.fire_all().await;

    assert_eq!(h.events.count_of("admin.session.warning"), 0);
    assert_eq!(h.events.count_of("admin.session.expired"), 1);
}

#[tokio::test]
async fn expiry_releases_the_tick_timer() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();
    assert_eq!(h.scheduler.live_task_count(), 1);

    h.clock.advance(Duration::minutes(30));
    h.scheduler.fire_all().await;
    assert_eq!(h.scheduler.live_task_count(), 0);
}

#[tokio::test]
async fn extend_session_restarts_the_schedule() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.clock.advance(Duration::minutes(25));
    h.scheduler.fire_all().await;
    assert_eq!(h.session.state(), SessionState::WarningPending);

    h.session.extend_session().await.unwrap();
    assert_eq!(h.session.state(), SessionState::Active);
    assert_eq!(h.events.count_of("admin.session.extended"), 1);
    assert_eq!(h.session.time_remaining(), Duration::minutes(30));

    // the warning/expiry schedule is now relative to the extension
    h.clock.advance(Duration::minutes(24) + Duration::seconds(59));
    h.scheduler.fire_all().await;
    assert_eq!(h.events.count_of("admin.session.warning"), 1);

    h.clock.advance(Duration::seconds(1));
    h.scheduler.fire_all().await;
    assert_eq!(h.events.count_of("admin.session.warning"), 2);
}

#[tokio::test]
async fn activity_resets_the_idle_clock() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.clock.advance(Duration::minutes(20));
    h.source.emit(ActivityKind::PointerMove).await;
    assert_eq!(h.session.time_remaining(), Duration::minutes(30));

    // idle measured from the activity, not from login
    h.clock.advance(Duration::minutes(29));
    h.scheduler.fire_all().await;
    assert!(h.session.is_authenticated());
    assert_eq!(h.events.count_of("admin.session.warning"), 1);

    // a key press clears the pending warning silently
    h.source.emit(ActivityKind::KeyDown).await;
    assert_eq!(h.session.state(), SessionState::Active);
    assert_eq!(h.events.count_of("admin.session.extended"), 0);
}

#[tokio::test]
async fn activity_subscription_lives_and_dies_with_the_session() {
    let h = harness().await;
    assert_eq!(h.source.subscriber_count(), 0);

    h.session.login(SECRET).await.unwrap();
    assert_eq!(h.source.subscriber_count(), 1);

    // a second login must not double-subscribe
    h.session.login(SECRET).await.unwrap();
    assert_eq!(h.source.subscriber_count(), 1);

    h.session.logout().await.unwrap();
    assert_eq!(h.source.subscriber_count(), 0);

    // events observed after logout do not resurrect the session
    h.source.emit(ActivityKind::PointerMove).await;
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.session.logout().await.unwrap();
    h.session.logout().await.unwrap();

    assert!(!h.session.is_authenticated());
    assert_eq!(h.events.count_of("admin.session.logged_out"), 1);
}

#[tokio::test]
async fn restore_resumes_a_fresh_session() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();
    let original_id = h.session.session_id().unwrap();

    h.session.shutdown();
    h.clock.advance(Duration::minutes(10));

    let (restored, scheduler, _events) = reload(&h).await;
    assert!(restored.is_authenticated());
    assert_eq!(restored.session_id().as_deref(), Some(original_id.as_str()));
    assert_eq!(restored.time_remaining(), Duration::minutes(20));
    // the tick timer is re-armed for the restored session
    assert_eq!(scheduler.live_task_count(), 1);
}

#[tokio::test]
async fn restore_discards_a_stale_session() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();
    h.session.shutdown();

    h.clock.advance(Duration::minutes(30));

    let (restored, scheduler, _events) = reload(&h).await;
    assert!(!restored.is_authenticated());
    assert_eq!(restored.state(), SessionState::LoggedOut);
    assert_eq!(scheduler.live_task_count(), 0);
    assert!(h.store.read("admin_session").await.unwrap().is_none());
}

#[tokio::test]
async fn restore_clears_a_corrupt_record() {
    let h = harness().await;
    h.store.write("admin_session", "{definitely not json").await.unwrap();

    let (restored, _scheduler, _events) = reload(&h).await;
    assert!(!restored.is_authenticated());
    assert!(h.store.read("admin_session").await.unwrap().is_none());
}

#[tokio::test]
async fn restore_keeps_a_pending_warning_pending() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.clock.advance(Duration::minutes(26));
    h.scheduler.fire_all().await;
    assert_eq!(h.session.state(), SessionState::WarningPending);
    h.session.shutdown();

    let (restored, _scheduler, events) = reload(&h).await;
    assert_eq!(restored.state(), SessionState::WarningPending);
    // the warning is not re-fired on restore
    assert_eq!(events.count_of("admin.session.warning"), 0);

    restored.extend_session().await.unwrap();
    assert_eq!(restored.state(), SessionState::Active);
}

#[tokio::test]
async fn time_remaining_renders_as_mm_ss() {
    let h = harness().await;
    h.session.login(SECRET).await.unwrap();

    h.clock.advance(Duration::minutes(5) + Duration::seconds(1));
    assert_eq!(wicket::format::clock(h.session.time_remaining()), "24:59");
}
