//! Built-in event listeners.
//!
//! These listeners provide common functionality out of the box. Register
//! them via [`AdminSessionBuilder::listen`](crate::AdminSessionBuilder::listen).

mod logging;
#[cfg(feature = "tracing")]
mod tracing;

pub use logging::LoggingListener;
#[cfg(feature = "tracing")]
pub use self::tracing::TracingListener;
