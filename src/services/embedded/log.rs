//! # EventLogger: simple message printer
//!
//! A minimal service that subscribes to a chosen set of event types and logs
//! every message it receives through `tracing`. Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! INFO svcbus::services::embedded::log: event received service="event-logger" event="KeepAlive" seq=0 payload_len=0
//! INFO svcbus::services::embedded::log: event received service="event-logger" event="KeepAliveResp" seq=1 payload_len=8
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::events::{EventMessage, EventType};
use crate::services::Service;

/// Logging service.
pub struct EventLogger<E: EventType> {
    name: String,
    events: Vec<E>,
    capacity: Option<usize>,
    seen: Arc<AtomicU64>,
}

impl<E: EventType> EventLogger<E> {
    /// Logger subscribed to `events`.
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = E>) -> Self {
        Self {
            name: "event-logger".to_string(),
            events: events.into_iter().collect(),
            capacity: None,
            seen: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Override the service name shown in logs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Configure the inbox capacity for this logger.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity.max(1));
        self
    }

    /// Shared count of messages logged so far; stays readable after the logger
    /// is moved into its run-loop.
    pub fn seen_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.seen)
    }
}

#[async_trait]
impl<E: EventType> Service for EventLogger<E> {
    type Event = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> &[E] {
        &self.events
    }

    fn inbox_capacity(&self) -> Option<usize> {
        self.capacity
    }

    async fn initialize(&mut self) -> Result<(), ServiceError> {
        tracing::info!(service = %self.name, events = ?self.events, "event logger ready");
        Ok(())
    }

    fn next_timeout(&self) -> Option<Duration> {
        None
    }

    async fn on_event(&mut self, msg: &EventMessage<E>) -> Result<(), ServiceError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            service = %self.name,
            event = msg.event().name(),
            seq = msg.seq(),
            payload_len = msg.payload_len(),
            "event received"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventBus;
    use crate::events::EventId;
    use crate::services::ServiceHost;

    #[tokio::test(start_paused = true)]
    async fn test_logs_only_subscribed_events() {
        let mut host = ServiceHost::new(EventBus::<EventId>::default());
        let logger = EventLogger::new([EventId::KeepAliveResp]).with_name("resp-log");
        let seen = logger.seen_counter();
        host.spawn(logger).unwrap();

        assert!(!host.bus().post_empty(EventId::KeepAlive));
        assert!(host.bus().post_event(EventId::KeepAliveResp, &7u64.to_le_bytes()));
        assert!(host.bus().post_event(EventId::KeepAliveResp, &8u64.to_le_bytes()));

        for _ in 0..100 {
            if seen.load(Ordering::Relaxed) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(seen.load(Ordering::Relaxed), 2);
        assert_eq!(host.names(), vec!["resp-log"]);
        host.shutdown().await.unwrap();
    }

    #[test]
    fn test_capacity_is_clamped() {
        let logger = EventLogger::new(EventId::ALL).with_capacity(0);
        assert_eq!(logger.inbox_capacity(), Some(1));
        assert_eq!(logger.subscriptions(), &EventId::ALL);
    }
}
