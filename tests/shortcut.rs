//! Keyboard entry-point suite.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use wicket::events::{AdminEvent, Listener};
use wicket::{
    AdminConfig, AdminSession, AdminSessionBuilder, InMemoryStateStore, KeyChord, KeyPress,
    ManualClock, ManualScheduler, ShortcutAction, ShortcutBinding, ShortcutDispatcher,
};

const SECRET: &str = "correct horse battery staple";

#[derive(Clone, Default)]
struct RecordingListener {
    names: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingListener {
    fn count_of(&self, name: &str) -> usize {
        self.names.lock().unwrap().iter().filter(|n| **n == name).count()
    }
}

#[async_trait]
impl Listener for RecordingListener {
    async fn handle(&self, event: &AdminEvent) {
        self.names.lock().unwrap().push(event.name());
    }
}

async fn session_with(
    binding: ShortcutBinding,
) -> (Arc<AdminSession>, ManualClock, RecordingListener) {
    let clock = ManualClock::starting_now();
    let events = RecordingListener::default();

    let config = AdminConfig {
        shortcut: binding,
        ..AdminConfig::new(SECRET)
    };
    let session = AdminSessionBuilder::new(config)
        .clock(Arc::new(clock.clone()))
        .store(Arc::new(InMemoryStateStore::new()))
        .scheduler(Arc::new(ManualScheduler::new()))
        .listen(events.clone())
        .build()
        .await
        .unwrap();

    (session, clock, events)
}

fn chord_press() -> KeyPress {
    KeyPress::plain('a').with_ctrl().with_alt().with_shift()
}

#[tokio::test]
async fn chord_requests_the_login_prompt_when_logged_out() {
    let (session, _clock, events) = session_with(ShortcutBinding::default()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    let action = dispatcher.handle_key(chord_press()).await.unwrap();
    assert_eq!(action, Some(ShortcutAction::ShowLogin));
    assert_eq!(events.count_of("admin.login.prompt"), 1);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn unrelated_keys_do_nothing() {
    let (session, _clock, events) = session_with(ShortcutBinding::default()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    assert!(dispatcher.handle_key(KeyPress::plain('a')).await.unwrap().is_none());
    assert!(dispatcher
        .handle_key(KeyPress::plain('a').with_ctrl().with_alt())
        .await
        .unwrap()
        .is_none());
    assert_eq!(events.count_of("admin.login.prompt"), 0);
}

#[tokio::test]
async fn chord_logs_out_an_authenticated_session() {
    let (session, _clock, events) = session_with(ShortcutBinding::default()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    session.login(SECRET).await.unwrap();

    let action = dispatcher.handle_key(chord_press()).await.unwrap();
    assert_eq!(action, Some(ShortcutAction::LoggedOut));
    assert!(!session.is_authenticated());
    assert_eq!(events.count_of("admin.session.logged_out"), 1);
    // logging out must not also request the prompt
    assert_eq!(events.count_of("admin.login.prompt"), 0);
}

#[tokio::test]
async fn chord_is_ignored_while_locked_out() {
    let (session, _clock, events) = session_with(ShortcutBinding::default()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    for _ in 0..5 {
        session.login("wrong guess").await.unwrap();
    }
    assert!(session.is_locked().await.unwrap());

    let action = dispatcher.handle_key(chord_press()).await.unwrap();
    assert_eq!(action, None);
    assert_eq!(events.count_of("admin.login.prompt"), 0);
}

fn sequence_binding() -> ShortcutBinding {
    ShortcutBinding::Sequence {
        first: KeyChord::new('a').ctrl().shift(),
        second: 'd',
        window: Duration::seconds(2),
    }
}

fn first_press() -> KeyPress {
    KeyPress::plain('a').with_ctrl().with_shift()
}

#[tokio::test]
async fn sequence_triggers_within_the_window() {
    let (session, clock, events) = session_with(sequence_binding()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    assert!(dispatcher.handle_key(first_press()).await.unwrap().is_none());
    assert!(dispatcher.is_armed());

    clock.advance(Duration::seconds(1));
    let action = dispatcher.handle_key(KeyPress::plain('d')).await.unwrap();
    assert_eq!(action, Some(ShortcutAction::ShowLogin));
    assert!(!dispatcher.is_armed());
    assert_eq!(events.count_of("admin.login.prompt"), 1);
}

#[tokio::test]
async fn sequence_disarms_when_the_window_elapses() {
    let (session, clock, events) = session_with(sequence_binding()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    dispatcher.handle_key(first_press()).await.unwrap();
    clock.advance(Duration::seconds(3));

    let action = dispatcher.handle_key(KeyPress::plain('d')).await.unwrap();
    assert_eq!(action, None);
    assert!(!dispatcher.is_armed());
    assert_eq!(events.count_of("admin.login.prompt"), 0);
}

#[tokio::test]
async fn sequence_is_disarmed_by_an_unrelated_key() {
    let (session, clock, events) = session_with(sequence_binding()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    dispatcher.handle_key(first_press()).await.unwrap();
    dispatcher.handle_key(KeyPress::plain('x')).await.unwrap();
    assert!(!dispatcher.is_armed());

    // the second key alone no longer completes the shortcut
    clock.advance(Duration::seconds(1));
    let action = dispatcher.handle_key(KeyPress::plain('d')).await.unwrap();
    assert_eq!(action, None);
    assert_eq!(events.count_of("admin.login.prompt"), 0);
}

#[tokio::test]
async fn repeating_the_first_chord_rearms() {
    let (session, clock, _events) = session_with(sequence_binding()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    dispatcher.handle_key(first_press()).await.unwrap();
    clock.advance(Duration::seconds(3));

    // window elapsed, but pressing the chord again starts a fresh one
    dispatcher.handle_key(first_press()).await.unwrap();
    assert!(dispatcher.is_armed());

    let action = dispatcher.handle_key(KeyPress::plain('d')).await.unwrap();
    assert_eq!(action, Some(ShortcutAction::ShowLogin));
}

#[tokio::test]
async fn sequence_second_key_without_arming_does_nothing() {
    let (session, _clock, events) = session_with(sequence_binding()).await;
    let dispatcher = ShortcutDispatcher::new(Arc::clone(&session));

    let action = dispatcher.handle_key(KeyPress::plain('d')).await.unwrap();
    assert_eq!(action, None);
    assert_eq!(events.count_of("admin.login.prompt"), 0);
}
