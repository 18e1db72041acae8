//! Event data model: identifiers, messages and delivery handles.
//!
//! ## Contents
//! - [`EventType`], [`EventId`] build-time-fixed event identifiers
//! - [`EventMessage`] immutable record with an optional owned payload
//! - [`Delivery`] one subscriber's share of a posted event
//!
//! See `core/mod.rs` for how the bus routes these to inboxes.

mod delivery;
mod kind;
mod message;

pub(crate) use delivery::Distribution;
pub use delivery::Delivery;
pub use kind::{EventId, EventType};
pub use message::EventMessage;
