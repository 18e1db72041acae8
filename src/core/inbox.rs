//! # Service inboxes and endpoints.
//!
//! An [`Inbox`] is a bounded FIFO queue of [`Delivery`] handles owned by exactly
//! one service. Its [`Endpoint`] is the cloneable sending side that the
//! subscription registry stores.
//!
//! ```text
//!   EventBus::post_event ──try_send──► Endpoint ──► [bounded mpsc] ──► Inbox ──► run-loop
//! ```
//!
//! ## Rules
//! - **Non-blocking enqueue**: the bus only ever uses `try_send`.
//! - **Blocking dequeue with a deadline**: the owning service waits on
//!   [`EventBus::get_event`](crate::EventBus::get_event).
//! - **Identity**: two endpoints are equal iff they feed the same inbox.
//! - Dropping the inbox closes it; later enqueues report `Closed`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time;

use crate::events::{Delivery, EventType};

/// Cloneable handle to one service's inbox.
pub struct Endpoint<E: EventType> {
    name: Arc<str>,
    sender: mpsc::Sender<Delivery<E>>,
}

impl<E: EventType> Endpoint<E> {
    /// Diagnostic name of the owning service.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the owning [`Inbox`] has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Non-blocking enqueue; hands the delivery back on failure.
    pub(crate) fn try_deliver(
        &self,
        delivery: Delivery<E>,
    ) -> Result<(), TrySendError<Delivery<E>>> {
        self.sender.try_send(delivery)
    }
}

impl<E: EventType> Clone for Endpoint<E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            sender: self.sender.clone(),
        }
    }
}

impl<E: EventType> PartialEq for Endpoint<E> {
    fn eq(&self, other: &Self) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

impl<E: EventType> Eq for Endpoint<E> {}

impl<E: EventType> fmt::Debug for Endpoint<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Bounded FIFO of deliveries owned by one service.
pub struct Inbox<E: EventType> {
    endpoint: Endpoint<E>,
    rx: mpsc::Receiver<Delivery<E>>,
}

impl<E: EventType> Inbox<E> {
    /// Creates an inbox holding at most `capacity` deliveries (minimum 1).
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        let (sender, rx) = mpsc::channel(capacity.max(1));
        Self {
            endpoint: Endpoint {
                name: name.into(),
                sender,
            },
            rx,
        }
    }

    /// Returns a handle for registering this inbox on a bus.
    pub fn endpoint(&self) -> Endpoint<E> {
        self.endpoint.clone()
    }

    /// Diagnostic name of the owning service.
    pub fn name(&self) -> &str {
        self.endpoint.name()
    }

    /// Maximum number of pending deliveries.
    pub fn capacity(&self) -> usize {
        self.endpoint.sender.max_capacity()
    }

    /// Number of deliveries waiting to be received.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Waits up to `max_wait` (`None` = indefinitely) for the next delivery.
    pub(crate) async fn recv(&mut self, max_wait: Option<Duration>) -> Option<Delivery<E>> {
        match max_wait {
            Some(wait) => time::timeout(wait, self.rx.recv()).await.ok().flatten(),
            None => self.rx.recv().await,
        }
    }

    /// Takes the next delivery if one is already waiting.
    pub(crate) fn try_recv(&mut self) -> Option<Delivery<E>> {
        self.rx.try_recv().ok()
    }
}

impl<E: EventType> fmt::Debug for Inbox<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox")
            .field("name", &self.endpoint.name)
            .field("pending", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventId;

    #[test]
    fn test_endpoint_identity_is_channel_identity() {
        let a = Inbox::<EventId>::new("a", 4);
        let b = Inbox::<EventId>::new("a", 4);

        assert_eq!(a.endpoint(), a.endpoint());
        assert_ne!(a.endpoint(), b.endpoint());
    }

    #[test]
    fn test_capacity_is_clamped() {
        let inbox = Inbox::<EventId>::new("tiny", 0);
        assert_eq!(inbox.capacity(), 1);
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_endpoint_reports_closed_after_drop() {
        let inbox = Inbox::<EventId>::new("gone", 1);
        let ep = inbox.endpoint();
        assert!(!ep.is_closed());
        drop(inbox);
        assert!(ep.is_closed());
    }
}
