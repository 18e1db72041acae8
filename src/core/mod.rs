//! Bus core: routing, inboxes and counters.
//!
//! Internal modules:
//! - [`bus`]: the [`EventBus`] façade (register / post / receive / dispose);
//! - [`registry`]: event-type-indexed subscriber table behind a lock;
//! - [`inbox`]: bounded per-service queues and their endpoints;
//! - [`stats`]: delivery and loss counters.
//!
//! ## Wiring
//! ```text
//! ServiceHost::spawn(svc)
//!   ├─► Inbox::new(name, svc.inbox_capacity())
//!   ├─► EventBus::register_endpoint(endpoint, svc.subscriptions())
//!   └─► tokio::spawn(run-loop(svc, inbox))
//!
//! producer ── post_event ──► EventBus ──► registry[E] ──► Endpoint::try_deliver ──► Inbox
//! run-loop ── get_event  ──► Inbox ──► Delivery ──► on_event ──► dispose_event
//! ```

mod bus;
mod inbox;
mod registry;
mod stats;

pub use bus::EventBus;
pub use inbox::{Endpoint, Inbox};
pub use stats::{BusStats, StatsSnapshot};
