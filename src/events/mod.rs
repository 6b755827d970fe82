//! Team lifecycle events.
//!
//! Actions fire events after their store call succeeds. When no listeners
//! are registered, dispatch is a no-op.
//!
//! ```rust,ignore
//! use covenant::register_event_listeners;
//! use covenant::events::listeners::LoggingListener;
//!
//! register_event_listeners(|registry| {
//!     registry.listen(LoggingListener::new());
//! });
//! ```
//!
//! Implement [`Listener`] for custom handling:
//!
//! ```rust,ignore
//! use covenant::events::{Listener, TeamEvent};
//! use async_trait::async_trait;
//!
//! struct AuditListener;
//!
//! #[async_trait]
//! impl Listener for AuditListener {
//!     async fn handle(&self, event: &TeamEvent) {
//!         if let TeamEvent::TeamEmailVerified { team_id, email, .. } = event {
//!             // write audit row
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::TeamEvent;
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};
