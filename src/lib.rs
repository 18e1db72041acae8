//! # svcbus
//!
//! **svcbus** is a lightweight in-process publish/subscribe event bus for Rust.
//!
//! Independent services, each driven by its own tokio task, exchange small
//! typed messages without knowing about each other. Producers post by event
//! type; the bus fans the message out to every subscribed service's bounded
//! inbox and reclaims it once the last subscriber has disposed of it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Producer   │
//!     │ (heartbeat)  │   │ (responder)  │   │ (any thread) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ post_event       │ post_event       │ post_event
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus<E>                                                      │
//! │  - SubscriptionRegistry (E::COUNT slots, RwLock)                  │
//! │  - one Arc<Distribution> per post, shared by all subscribers      │
//! │  - BusStats (posted / delivered / dropped / reclaimed ...)        │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        │ try_send         │ try_send         │ try_send (full → drop)
//!        ▼                  ▼                  ▼
//!     [Inbox 1]          [Inbox 2]          [Inbox N]
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//!     run-loop           run-loop           run-loop      (ServiceHost)
//!     on_event ─► dispose_event ─► released == k ─► reclaimed
//! ```
//!
//! ### Run-loop
//! ```text
//! initialize()
//! loop {
//!   ├─► wait = next_timeout()          (None = no scheduled wake-up)
//!   ├─► get_event(inbox, wait)         (raced against the host's token)
//!   │       ├─ Some(delivery) ─► on_event(msg) ─► dispose_event(delivery)
//!   │       └─ None           ─► on_timeout()
//!   └─► on_loop_end()
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                         |
//! |-------------------|-------------------------------------------------------------------|--------------------------------------------|
//! | **Bus**           | Register, post, receive and dispose; refcounted fan-out.          | [`EventBus`], [`Delivery`]                 |
//! | **Inboxes**       | Bounded per-service queues; overflow drops the delivery.          | [`Inbox`], [`Endpoint`]                    |
//! | **Events**        | Compile-time event type domains and their messages.               | [`EventType`], [`EventId`], [`EventMessage`] |
//! | **Services**      | Hook-based service contract and its hosted run-loops.             | [`Service`], [`ServiceHost`], [`Deadline`] |
//! | **Errors**        | Typed errors for registration, hooks and teardown.                | [`BusError`], [`ServiceError`], [`RuntimeError`] |
//! | **Configuration** | Inbox capacity, subscriber limit and grace period.                | [`Config`]                                 |
//! | **Observability** | Delivery and loss counters.                                       | [`BusStats`], [`StatsSnapshot`]            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `EventLogger` service _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use svcbus::{EventBus, EventId, EventMessage, Service, ServiceError, ServiceHost};
//!
//! struct Responder;
//!
//! #[async_trait]
//! impl Service for Responder {
//!     type Event = EventId;
//!
//!     fn name(&self) -> &str { "responder" }
//!
//!     fn subscriptions(&self) -> &[EventId] { &[EventId::KeepAlive] }
//!
//!     async fn initialize(&mut self) -> Result<(), ServiceError> { Ok(()) }
//!
//!     fn next_timeout(&self) -> Option<Duration> { None }
//!
//!     async fn on_event(&mut self, msg: &EventMessage<EventId>) -> Result<(), ServiceError> {
//!         println!("keep-alive #{}", msg.seq());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::<EventId>::default();
//!     let mut host = ServiceHost::new(bus.clone());
//!
//!     // Subscriptions are live as soon as spawn returns.
//!     host.spawn(Responder)?;
//!     bus.post_empty(EventId::KeepAlive);
//!
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!     host.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod services;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_INBOX_CAPACITY, MAX_EVENT_SUBS};
pub use core::{BusStats, Endpoint, EventBus, Inbox, StatsSnapshot};
pub use error::{BusError, RuntimeError, ServiceError};
pub use events::{Delivery, EventId, EventMessage, EventType};
pub use services::{Deadline, Service, ServiceHost};

// Optional: expose a simple built-in logging service (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use services::EventLogger;
