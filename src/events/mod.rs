//! Event system for session lifecycle signals.
//!
//! The manager pushes state changes to its UI collaborators instead of being
//! polled: "show the login prompt", "the session is about to expire", "the
//! session ended". Listeners are registered on the
//! [`AdminSessionBuilder`](crate::AdminSessionBuilder) before the manager is
//! built; if none are registered, events are silently ignored.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wicket::{AdminConfig, AdminSessionBuilder};
//! use wicket::events::listeners::LoggingListener;
//!
//! let session = AdminSessionBuilder::new(AdminConfig::default())
//!     .listen(LoggingListener::new())
//!     .build()
//!     .await?;
//! ```
//!
//! # Custom Listeners
//!
//! Implement the [`Listener`] trait to drive a UI:
//!
//! ```rust,ignore
//! use wicket::events::{AdminEvent, Listener};
//! use async_trait::async_trait;
//!
//! struct DialogListener { /* channel to the UI task */ }
//!
//! #[async_trait]
//! impl Listener for DialogListener {
//!     async fn handle(&self, event: &AdminEvent) {
//!         match event {
//!             AdminEvent::LoginPromptRequested { .. } => { /* open login dialog */ }
//!             AdminEvent::SessionWarning { remaining_secs, .. } => { /* show countdown */ }
//!             AdminEvent::SessionExpired { .. } => { /* back to login */ }
//!             _ => {}
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::AdminEvent;
pub use listener::Listener;
pub use registry::EventRegistry;
