//! # Event bus: registration, post, receive and dispose.
//!
//! [`EventBus`] combines the subscription registry with the refcounted
//! distribution protocol. It is an explicit, cheaply cloneable instance (an
//! `Arc` inside) handed to every producer and service that needs it.
//!
//! ## Architecture
//! ```text
//! Producers (any thread):             Services (one task each):
//!   post_event(E, bytes) ──┐
//!                          ▼
//!        registry[E] (read lock) ── snapshot k endpoints
//!                          │
//!          one Arc<Distribution { msg, k, released }>
//!                          │
//!     ┌────────────────────┼────────────────────┐
//!     ▼ try_send           ▼ try_send           ▼ try_send
//!  [inbox 1]            [inbox 2] (full)     [inbox k]
//!     │                 release now             │
//!     ▼                                         ▼
//!  get_event(inbox, wait) → Delivery      get_event(...) → Delivery
//!     │                                         │
//!  dispose_event(d) ─► released += 1 ... released == k ─► reclaimed
//! ```
//!
//! ## Rules
//! - **Non-blocking post**: `post_event` never waits for an inbox; a full or
//!   closed inbox loses that one delivery.
//! - **One allocation per post**, shared by every subscriber.
//! - **Per-inbox FIFO**: a subscriber observes events in post order.
//! - **Register before post**: registration for a type should complete before
//!   anything posts that type; the registry is locked either way.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use svcbus::{Config, EventBus, EventId, Inbox};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::<EventId>::new(Config::default());
//! let mut inbox = Inbox::new("watchdog", 20);
//! bus.register_endpoint(&inbox.endpoint(), &[EventId::KeepAlive]).unwrap();
//!
//! assert!(bus.post_event(EventId::KeepAlive, b"ping"));
//!
//! let delivery = bus.get_event(&mut inbox, Some(Duration::from_millis(10))).await.unwrap();
//! assert_eq!(delivery.payload(), b"ping");
//! bus.dispose_event(delivery);
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;

use super::inbox::{Endpoint, Inbox};
use super::registry::SubscriptionRegistry;
use super::stats::{BusStats, StatsSnapshot};
use crate::config::Config;
use crate::error::BusError;
use crate::events::{Delivery, Distribution, EventMessage, EventType};

struct Inner<E: EventType> {
    cfg: Config,
    registry: SubscriptionRegistry<E>,
    stats: Arc<BusStats>,
    /// Next sequence number; held across fan-out so inbox order matches `seq` order.
    seq: Mutex<u64>,
}

/// Publish/subscribe bus for one node.
pub struct EventBus<E: EventType> {
    inner: Arc<Inner<E>>,
}

impl<E: EventType> EventBus<E> {
    /// Creates a bus with an empty registry sized for `E::COUNT` event types.
    pub fn new(cfg: Config) -> Self {
        let registry = SubscriptionRegistry::new(cfg.subscriber_limit());
        Self {
            inner: Arc::new(Inner {
                cfg,
                registry,
                stats: Arc::new(BusStats::default()),
                seq: Mutex::new(0),
            }),
        }
    }

    /// Configuration the bus was created with.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Subscribes `endpoint` to every type in `events` (idempotent).
    ///
    /// ### Errors
    /// - [`BusError::InvalidArgument`]: some type is out of range; nothing registered.
    /// - [`BusError::CapacityExceeded`]: some slots were full; the rest were registered.
    pub fn register_endpoint(&self, endpoint: &Endpoint<E>, events: &[E]) -> Result<(), BusError> {
        let res = self.inner.registry.register(endpoint, events);
        match &res {
            Ok(()) => {
                tracing::debug!(endpoint = endpoint.name(), events = ?events, "endpoint registered")
            }
            Err(e) => tracing::warn!(
                endpoint = endpoint.name(),
                error = e.as_label(),
                detail = %e.as_message(),
                "endpoint registration incomplete"
            ),
        }
        res
    }

    /// Removes `endpoint` from every event type; returns the number of subscriptions removed.
    pub fn unregister_endpoint(&self, endpoint: &Endpoint<E>) -> usize {
        let removed = self.inner.registry.unregister(endpoint);
        tracing::debug!(endpoint = endpoint.name(), removed, "endpoint unregistered");
        removed
    }

    /// True if `endpoint` is subscribed to `event`.
    pub fn is_subscribed(&self, endpoint: &Endpoint<E>, event: E) -> bool {
        self.inner.registry.is_subscribed(endpoint, event)
    }

    /// Number of endpoints subscribed to `event`.
    pub fn subscriber_count(&self, event: E) -> usize {
        self.inner.registry.subscriber_count(event)
    }

    /// Clears the subscribers of one event type.
    ///
    /// Intended for (re)initialization, not for use while producers are posting.
    pub fn reset(&self, event: E) {
        self.inner.registry.reset(event);
    }

    /// Clears every subscription.
    ///
    /// Intended for (re)initialization, not for use while producers are posting.
    pub fn reset_all(&self) {
        self.inner.registry.reset_all();
    }

    /// Posts `event` with a copy of `payload` (empty slice = no payload) to every subscriber.
    ///
    /// Returns `false` if nobody is subscribed (nothing is allocated), `true` once
    /// a delivery attempt has been made to every subscriber, whether or not each
    /// attempt succeeded.
    ///
    /// # Panics
    /// If `event.index()` is outside `[0, E::COUNT)`.
    pub fn post_event(&self, event: E, payload: &[u8]) -> bool {
        let index = event.index();
        assert!(
            index < E::COUNT,
            "post_event: event index {index} is outside [0, {})",
            E::COUNT
        );

        let stats = &self.inner.stats;
        self.inner.registry.with_subscribers(event, |subs| {
            if subs.is_empty() {
                stats.record_unrouted();
                tracing::trace!(event = event.name(), "post without subscribers");
                return false;
            }

            let mut next = self.inner.seq.lock().unwrap_or_else(PoisonError::into_inner);
            let seq = *next;
            *next += 1;

            let message = EventMessage::new(event, seq, payload);
            let item = Distribution::new(message, subs.len(), Arc::clone(stats));
            stats.record_posted();

            for endpoint in subs {
                match endpoint.try_deliver(Delivery::new(Arc::clone(&item))) {
                    Ok(()) => {
                        stats.record_delivered();
                        tracing::trace!(
                            endpoint = endpoint.name(),
                            event = event.name(),
                            seq,
                            "delivered"
                        );
                    }
                    Err(TrySendError::Full(_share)) => {
                        stats.record_dropped_full();
                        tracing::warn!(
                            endpoint = endpoint.name(),
                            event = event.name(),
                            seq,
                            reason = "full",
                            "delivery dropped"
                        );
                    }
                    Err(TrySendError::Closed(_share)) => {
                        stats.record_dropped_closed();
                        tracing::warn!(
                            endpoint = endpoint.name(),
                            event = event.name(),
                            seq,
                            reason = "closed",
                            "delivery dropped"
                        );
                    }
                }
            }
            true
        })
    }

    /// Posts `event` without a payload. Shorthand for `post_event(event, &[])`.
    #[inline]
    pub fn post_empty(&self, event: E) -> bool {
        self.post_event(event, &[])
    }

    /// Waits up to `max_wait` (`None` = indefinitely) for the next delivery in `inbox`.
    ///
    /// Returns immediately if a delivery is already waiting; returns `None` once
    /// the wait elapses. The caller must eventually hand the delivery back with
    /// [`dispose_event`](Self::dispose_event).
    pub async fn get_event(
        &self,
        inbox: &mut Inbox<E>,
        max_wait: Option<Duration>,
    ) -> Option<Delivery<E>> {
        inbox.recv(max_wait).await
    }

    /// Takes the next delivery in `inbox` without waiting.
    pub fn try_get_event(&self, inbox: &mut Inbox<E>) -> Option<Delivery<E>> {
        inbox.try_recv()
    }

    /// Releases one subscriber's share of a delivery.
    ///
    /// # Panics
    /// If the delivery was posted on a different bus.
    pub fn dispose_event(&self, delivery: Delivery<E>) {
        assert!(
            delivery.belongs_to(&self.inner.stats),
            "dispose_event: delivery was posted on a different bus"
        );
        delivery.dispose();
    }

    /// Current counter values.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub(crate) fn stats_handle(&self) -> &BusStats {
        &self.inner.stats
    }
}

impl<E: EventType> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: EventType> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<E: EventType> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("cfg", &self.inner.cfg)
            .field("stats", &self.inner.stats.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventId;
    use tokio::time::Instant;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Broken;

    impl EventType for Broken {
        const COUNT: usize = 1;

        fn index(self) -> usize {
            1
        }

        fn name(self) -> &'static str {
            "Broken"
        }
    }

    fn subscribed(
        bus: &EventBus<EventId>,
        name: &str,
        cap: usize,
        events: &[EventId],
    ) -> Inbox<EventId> {
        let inbox = Inbox::new(name, cap);
        bus.register_endpoint(&inbox.endpoint(), events).unwrap();
        inbox
    }

    #[test]
    fn test_post_without_subscribers_is_noop() {
        let bus = EventBus::<EventId>::default();

        assert!(!bus.post_empty(EventId::KeepAlive));

        let stats = bus.stats();
        assert_eq!(stats.unrouted, 1);
        assert_eq!(stats.posted, 0);
        assert_eq!(stats.reclaimed, 0);
    }

    #[test]
    fn test_fan_out_to_every_subscriber() {
        let bus = EventBus::<EventId>::default();
        let mut inboxes: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|n| subscribed(&bus, n, 4, &[EventId::KeepAlive]))
            .collect();

        assert!(bus.post_event(EventId::KeepAlive, b"hi"));
        assert_eq!(bus.stats().delivered, 3);

        let deliveries: Vec<_> = inboxes
            .iter_mut()
            .map(|inbox| bus.try_get_event(inbox).expect("each inbox gets a copy"))
            .collect();
        for d in &deliveries {
            assert_eq!(d.subscriber_count(), 3);
            assert_eq!(d.payload(), b"hi");
        }

        for d in deliveries {
            assert_eq!(bus.stats().reclaimed, 0);
            bus.dispose_event(d);
        }
        assert_eq!(bus.stats().reclaimed, 1);
    }

    #[test]
    fn test_fifo_per_endpoint() {
        let bus = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "svc", 4, &EventId::ALL);

        bus.post_empty(EventId::KeepAlive);
        bus.post_event(EventId::KeepAliveResp, &7u32.to_le_bytes());

        let first = bus.try_get_event(&mut inbox).unwrap();
        let second = bus.try_get_event(&mut inbox).unwrap();
        assert_eq!(first.event(), EventId::KeepAlive);
        assert_eq!(second.event(), EventId::KeepAliveResp);
        assert!(first.seq() < second.seq());
    }

    #[test]
    fn test_full_inbox_drops_and_releases_share() {
        let bus = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "slow", 1, &[EventId::KeepAlive]);

        assert!(bus.post_event(EventId::KeepAlive, b"one"));
        assert!(bus.post_event(EventId::KeepAlive, b"two"));

        let stats = bus.stats();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.dropped_full, 1);
        // the second item had a single subscriber, so it is already gone
        assert_eq!(stats.reclaimed, 1);

        let d = bus.try_get_event(&mut inbox).unwrap();
        assert_eq!(d.payload(), b"one");
        bus.dispose_event(d);
        assert!(bus.try_get_event(&mut inbox).is_none());
        assert_eq!(bus.stats().reclaimed, 2);
    }

    #[test]
    fn test_partial_drop_counts_toward_release() {
        let bus = EventBus::<EventId>::default();
        let mut slow = subscribed(&bus, "slow", 1, &[EventId::KeepAlive]);
        let mut fast = subscribed(&bus, "fast", 4, &[EventId::KeepAlive]);

        bus.post_empty(EventId::KeepAlive);
        bus.post_empty(EventId::KeepAlive);

        let first_fast = bus.try_get_event(&mut fast).unwrap();
        let second_fast = bus.try_get_event(&mut fast).unwrap();
        assert_eq!(second_fast.subscriber_count(), 2);
        assert_eq!(second_fast.released_count(), 1);

        bus.dispose_event(second_fast);
        assert_eq!(bus.stats().reclaimed, 1);

        bus.dispose_event(first_fast);
        let first_slow = bus.try_get_event(&mut slow).unwrap();
        bus.dispose_event(first_slow);
        assert_eq!(bus.stats().reclaimed, 2);
    }

    #[test]
    fn test_closed_inbox_is_released() {
        let bus = EventBus::<EventId>::default();
        let inbox = subscribed(&bus, "gone", 4, &[EventId::KeepAlive]);
        drop(inbox);

        assert!(bus.post_empty(EventId::KeepAlive));

        let stats = bus.stats();
        assert_eq!(stats.dropped_closed, 1);
        assert_eq!(stats.reclaimed, 1);
    }

    #[test]
    fn test_payload_copy_isolation() {
        let bus = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "svc", 4, &[EventId::KeepAliveResp]);

        let mut buf = vec![1u8, 2, 3, 4];
        bus.post_event(EventId::KeepAliveResp, &buf);
        buf.iter_mut().for_each(|b| *b = 0);
        drop(buf);

        let d = bus.try_get_event(&mut inbox).unwrap();
        assert_eq!(d.payload(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_registration_is_idempotent_on_bus() {
        let bus = EventBus::<EventId>::default();
        let inbox = subscribed(&bus, "svc", 4, &[EventId::KeepAlive]);
        bus.register_endpoint(&inbox.endpoint(), &[EventId::KeepAlive]).unwrap();

        assert_eq!(bus.subscriber_count(EventId::KeepAlive), 1);
        assert!(bus.is_subscribed(&inbox.endpoint(), EventId::KeepAlive));
    }

    #[test]
    fn test_embedded_limit_reports_capacity() {
        let bus = EventBus::<EventId>::new(Config::embedded());
        let inboxes: Vec<_> = (0..10)
            .map(|i| subscribed(&bus, &format!("svc-{i}"), 1, &[EventId::KeepAlive]))
            .collect();
        let extra = Inbox::new("extra", 1);

        let err = bus.register_endpoint(&extra.endpoint(), &[EventId::KeepAlive]).unwrap_err();
        assert_eq!(err.as_label(), "bus_capacity_exceeded");
        assert_eq!(bus.subscriber_count(EventId::KeepAlive), inboxes.len());
    }

    #[test]
    #[should_panic(expected = "outside [0, 1)")]
    fn test_post_out_of_range_panics() {
        let bus = EventBus::<Broken>::default();
        bus.post_empty(Broken);
    }

    #[test]
    #[should_panic(expected = "different bus")]
    fn test_dispose_on_foreign_bus_panics() {
        let bus = EventBus::<EventId>::default();
        let other = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "svc", 4, &[EventId::KeepAlive]);

        bus.post_empty(EventId::KeepAlive);
        let d = bus.try_get_event(&mut inbox).unwrap();
        other.dispose_event(d);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_event_times_out() {
        let bus = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "svc", 4, &[EventId::KeepAlive]);

        let start = Instant::now();
        let got = bus.get_event(&mut inbox, Some(Duration::from_millis(250))).await;

        assert!(got.is_none());
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_event_returns_pending_immediately() {
        let bus = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "svc", 4, &[EventId::KeepAlive]);
        bus.post_empty(EventId::KeepAlive);

        let start = Instant::now();
        let got = bus.get_event(&mut inbox, Some(Duration::from_secs(10))).await;

        assert!(got.is_some());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_wait_still_yields_pending() {
        let bus = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "svc", 4, &[EventId::KeepAlive]);
        bus.post_empty(EventId::KeepAlive);

        assert!(bus.get_event(&mut inbox, Some(Duration::ZERO)).await.is_some());
        assert!(bus.get_event(&mut inbox, Some(Duration::ZERO)).await.is_none());
    }

    #[test]
    fn test_inbox_order_matches_seq_under_concurrent_producers() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 500;

        for _ in 0..20 {
            let bus = EventBus::<EventId>::default();
            let capacity = PRODUCERS * PER_PRODUCER;
            let mut inbox = subscribed(&bus, "sink", capacity, &[EventId::KeepAlive]);

            let producers: Vec<_> = (0..PRODUCERS)
                .map(|_| {
                    let bus = bus.clone();
                    std::thread::spawn(move || {
                        for _ in 0..PER_PRODUCER {
                            bus.post_empty(EventId::KeepAlive);
                        }
                    })
                })
                .collect();
            for p in producers {
                p.join().unwrap();
            }

            let mut expected = 0;
            while let Some(d) = bus.try_get_event(&mut inbox) {
                assert_eq!(d.seq(), expected, "inbox order diverged from seq order");
                expected += 1;
            }
            assert_eq!(expected as usize, PRODUCERS * PER_PRODUCER);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_producers_reclaim_everything() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 50;

        let bus = EventBus::<EventId>::default();
        let mut inbox = subscribed(&bus, "sink", PRODUCERS * PER_PRODUCER, &[EventId::KeepAlive]);

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        bus.post_event(EventId::KeepAlive, &[p as u8, i as u8]);
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }

        let mut received = 0;
        while let Some(d) = bus.get_event(&mut inbox, Some(Duration::from_millis(50))).await {
            bus.dispose_event(d);
            received += 1;
        }

        let stats = bus.stats();
        assert_eq!(received, PRODUCERS * PER_PRODUCER);
        assert_eq!(stats.posted, stats.reclaimed);
        assert_eq!(stats.dropped(), 0);
    }
}
