use super::{AdminEvent, Listener};

/// Registry holding all registered event listeners.
///
/// Each manager owns its own registry: listeners are registered on the
/// [`AdminSessionBuilder`](crate::AdminSessionBuilder) and frozen when the
/// manager is built. There is no process-global registry, so two managers in
/// one process never see each other's events.
#[derive(Default)]
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener to receive events.
    ///
    /// Listeners are called in the order they are registered.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Dispatch an event to all registered listeners.
    ///
    /// If no listeners are registered, this is a no-op.
    pub(crate) async fn dispatch(&self, event: AdminEvent) {
        for listener in &self.listeners {
            listener.handle(&event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    struct CountingListener {
        count: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Listener for CountingListener {
        async fn handle(&self, _event: &AdminEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_all_listeners() {
        let count = Arc::new(AtomicU32::new(0));
        let mut registry = EventRegistry::new();
        registry
            .listen(CountingListener {
                count: Arc::clone(&count),
            })
            .listen(CountingListener {
                count: Arc::clone(&count),
            });

        assert_eq!(registry.len(), 2);

        registry
            .dispatch(AdminEvent::LoggedOut { at: Utc::now() })
            .await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispatch_without_listeners_is_noop() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty());

        registry
            .dispatch(AdminEvent::LoggedOut { at: Utc::now() })
            .await;
    }
}
