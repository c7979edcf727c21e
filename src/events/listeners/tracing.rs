use async_trait::async_trait;

use crate::events::{AdminEvent, Listener};

/// Emits session lifecycle events as tracing events.
///
/// Requires the `tracing` feature to be enabled.
///
/// # Example
///
/// ```rust,ignore
/// use wicket::{AdminConfig, AdminSessionBuilder};
/// use wicket::events::listeners::TracingListener;
///
/// let session = AdminSessionBuilder::new(AdminConfig::default())
///     .listen(TracingListener)
///     .build()
///     .await?;
/// ```
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &AdminEvent) {
        tracing::info!(
            target: "wicket::events",
            event_name = event.name(),
            ?event,
            "session event"
        );
    }
}
