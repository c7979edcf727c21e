use async_trait::async_trait;

use crate::events::{AdminEvent, Listener};

/// Logs all session lifecycle events using the `log` crate.
///
/// # Example
///
/// ```rust,ignore
/// use wicket::{AdminConfig, AdminSessionBuilder};
/// use wicket::events::listeners::LoggingListener;
///
/// let session = AdminSessionBuilder::new(AdminConfig::default())
///     .listen(LoggingListener::new())
///     .build()
///     .await?;
/// ```
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Creates a new logging listener at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    /// Creates a new logging listener at the specified level.
    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &AdminEvent) {
        log::log!(
            target: "wicket::events",
            self.level,
            "event={} {:?}",
            event.name(),
            event
        );
    }
}
