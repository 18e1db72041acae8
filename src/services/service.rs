//! # Core service trait
//!
//! `Service` is the extension point for plugging business logic onto the bus.
//! Each service is driven by a dedicated run-loop task fed by its own bounded
//! inbox, created and registered by the [`ServiceHost`](crate::ServiceHost).
//!
//! ## Contract
//! - [`Service::subscriptions`] is read once, before the loop starts.
//! - [`Service::initialize`] runs once, before the first wait.
//! - [`Service::next_timeout`] is asked before every wait: remaining time until
//!   the next scheduled wake-up (`Some(ZERO)` = due now, `None` = no wake-up).
//! - [`Service::on_event`] gets every delivered message; the delivery is disposed
//!   right after it returns (or fails, or panics).
//! - [`Service::on_timeout`] runs when the wait elapses with nothing delivered.
//! - [`Service::on_loop_end`] runs after either of the two above.
//! - Errors and panics from any hook are logged and contained; the loop goes on.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use svcbus::{EventId, EventMessage, Service, ServiceError};
//!
//! struct Watchdog {
//!     misses: u32,
//! }
//!
//! #[async_trait]
//! impl Service for Watchdog {
//!     type Event = EventId;
//!
//!     fn name(&self) -> &str { "watchdog" }
//!
//!     fn subscriptions(&self) -> &[EventId] { &[EventId::KeepAliveResp] }
//!
//!     async fn initialize(&mut self) -> Result<(), ServiceError> { Ok(()) }
//!
//!     fn next_timeout(&self) -> Option<Duration> { Some(Duration::from_secs(1)) }
//!
//!     async fn on_event(&mut self, _msg: &EventMessage<EventId>) -> Result<(), ServiceError> {
//!         self.misses = 0;
//!         Ok(())
//!     }
//!
//!     async fn on_timeout(&mut self) -> Result<(), ServiceError> {
//!         self.misses += 1;
//!         Ok(())
//!     }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::events::{EventMessage, EventType};

/// Contract for services hosted on an [`EventBus`](crate::EventBus).
///
/// Hooks take `&mut self`: a service's state is owned by its run-loop task and
/// is never shared with other services.
#[async_trait]
pub trait Service: Send + 'static {
    /// Event identifiers this service works with.
    type Event: EventType;

    /// Human-readable name (for logs and the inbox).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Event types to subscribe to.
    fn subscriptions(&self) -> &[Self::Event];

    /// Preferred inbox capacity; `None` uses the bus configuration.
    ///
    /// On overflow, deliveries to this service are **dropped**.
    fn inbox_capacity(&self) -> Option<usize> {
        None
    }

    /// Runs once before the loop starts waiting.
    async fn initialize(&mut self) -> Result<(), ServiceError>;

    /// Remaining time until the next scheduled wake-up.
    fn next_timeout(&self) -> Option<Duration>;

    /// Handles one delivered message.
    async fn on_event(&mut self, message: &EventMessage<Self::Event>) -> Result<(), ServiceError>;

    /// Runs when a wait elapses without a delivery.
    async fn on_timeout(&mut self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Runs at the end of every loop iteration.
    async fn on_loop_end(&mut self) -> Result<(), ServiceError> {
        Ok(())
    }
}
