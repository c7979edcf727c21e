use async_trait::async_trait;

use super::AdminEvent;

/// Trait for handling session lifecycle events asynchronously.
///
/// Implement this trait to connect the manager to a UI surface or any other
/// consumer: dialogs, logging, metrics, an audit trail.
///
/// # Example
///
/// ```rust,ignore
/// use wicket::events::{AdminEvent, Listener};
/// use async_trait::async_trait;
///
/// struct AuditListener;
///
/// #[async_trait]
/// impl Listener for AuditListener {
///     async fn handle(&self, event: &AdminEvent) {
///         if let AdminEvent::LockoutStarted { retry_after_secs, .. } = event {
///             // record the lockout
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Handle a session lifecycle event.
    ///
    /// This method is called for every event dispatched. Filter by matching
    /// on the event variant to handle specific events.
    async fn handle(&self, event: &AdminEvent);
}
