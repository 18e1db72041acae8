//! # Shared distribution envelope and per-subscriber delivery handles.
//!
//! One post creates exactly one distribution item, shared by every inbox it was
//! sent to. Each inbox receives a [`Delivery`]: a move-only handle owning one
//! share of that item.
//!
//! ## Lifetime
//! ```text
//! post_event(E, payload)
//!     │
//!     ▼
//! Arc<Distribution { message, subscribers: k, released: 0 }>
//!     │
//!     ├──► Delivery #1 ──► inbox 1 ──► dispose()  → released = 1
//!     ├──► Delivery #2 ──► inbox 2 (full) → released on the spot → released = 2
//!     └──► Delivery #k ──► inbox k ──► dispose()  → released = k → reclaimed
//! ```
//!
//! ## Rules
//! - `released` is incremented atomically; the release that makes it equal to
//!   `subscribers` reclaims the item, exactly once.
//! - A [`Delivery`] cannot be cloned, and disposing consumes it, so one consumer
//!   cannot release the same share twice.
//! - Dropping a [`Delivery`] without calling [`Delivery::dispose`] releases its
//!   share as well.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::kind::EventType;
use super::message::EventMessage;
use crate::core::BusStats;

/// Refcounted envelope shared by all deliveries of one post.
pub(crate) struct Distribution<E: EventType> {
    message: EventMessage<E>,
    subscribers: usize,
    released: AtomicUsize,
    stats: Arc<BusStats>,
}

impl<E: EventType> Distribution<E> {
    pub(crate) fn new(
        message: EventMessage<E>,
        subscribers: usize,
        stats: Arc<BusStats>,
    ) -> Arc<Self> {
        debug_assert!(subscribers > 0, "distribution without subscribers");
        Arc::new(Self {
            message,
            subscribers,
            released: AtomicUsize::new(0),
            stats,
        })
    }

    /// Releases one share; reclaims the item on the last one.
    fn release(&self) {
        let prev = self.released.fetch_add(1, Ordering::AcqRel);
        debug_assert!(
            prev < self.subscribers,
            "distribution released more than {} times",
            self.subscribers
        );

        if prev + 1 == self.subscribers {
            self.stats.record_reclaimed();
            tracing::debug!(
                event = self.message.event().name(),
                seq = self.message.seq(),
                subscribers = self.subscribers,
                "distribution reclaimed"
            );
        }
    }
}

/// One subscriber's share of a posted event.
///
/// Dereferences to the [`EventMessage`]. Hand it back with
/// [`EventBus::dispose_event`](crate::EventBus::dispose_event) (or
/// [`Delivery::dispose`]) once the message has been processed.
pub struct Delivery<E: EventType> {
    item: Arc<Distribution<E>>,
}

impl<E: EventType> Delivery<E> {
    pub(crate) fn new(item: Arc<Distribution<E>>) -> Self {
        Self { item }
    }

    /// The delivered message.
    #[inline]
    pub fn message(&self) -> &EventMessage<E> {
        &self.item.message
    }

    /// Number of inboxes targeted when the event was posted.
    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.item.subscribers
    }

    /// Number of shares already released (by other consumers or failed deliveries).
    #[inline]
    pub fn released_count(&self) -> usize {
        self.item.released.load(Ordering::Acquire)
    }

    /// Releases this share. Equivalent to dropping the handle.
    #[inline]
    pub fn dispose(self) {
        drop(self);
    }

    /// True if this delivery was posted on the bus owning `stats`.
    pub(crate) fn belongs_to(&self, stats: &Arc<BusStats>) -> bool {
        Arc::ptr_eq(&self.item.stats, stats)
    }
}

impl<E: EventType> Deref for Delivery<E> {
    type Target = EventMessage<E>;

    fn deref(&self) -> &Self::Target {
        self.message()
    }
}

impl<E: EventType> Drop for Delivery<E> {
    fn drop(&mut self) {
        self.item.release();
    }
}

impl<E: EventType> fmt::Debug for Delivery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("event", &self.item.message.event())
            .field("seq", &self.item.message.seq())
            .field("subscribers", &self.item.subscribers)
            .field("released", &self.released_count())
            .finish()
    }
}
