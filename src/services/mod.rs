//! Services and their run-loops.
//!
//! - [`Service`]: the trait business logic implements;
//! - [`ServiceHost`]: creates inboxes, registers subscriptions and spawns loops;
//! - [`Deadline`]: helper for computing `next_timeout`;
//! - `EventLogger` (feature `logging`): built-in logging service.

mod deadline;
mod host;
mod runner;
mod service;

#[cfg(feature = "logging")]
mod embedded;

pub use deadline::Deadline;
pub use host::ServiceHost;
pub use service::Service;

#[cfg(feature = "logging")]
pub use embedded::EventLogger;
