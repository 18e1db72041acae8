//! # Keep-alive Example
//!
//! Two services talk over the bus without knowing about each other:
//! - `heartbeat` posts `KeepAlive` every 100ms and counts the responses;
//! - `responder` answers each `KeepAlive` with a `KeepAliveResp` carrying its id.
//!
//! A built-in `EventLogger` traces everything on the bus.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example keep_alive --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use svcbus::{
    Deadline, EventBus, EventId, EventLogger, EventMessage, EventType, Service, ServiceError,
    ServiceHost,
};
use tracing_subscriber::EnvFilter;

const PERIOD: Duration = Duration::from_millis(100);

struct Heartbeat {
    bus: EventBus<EventId>,
    next: Deadline,
    responses: Arc<AtomicU64>,
}

#[async_trait]
impl Service for Heartbeat {
    type Event = EventId;

    fn name(&self) -> &str {
        "heartbeat"
    }

    fn subscriptions(&self) -> &[EventId] {
        &[EventId::KeepAliveResp]
    }

    async fn initialize(&mut self) -> Result<(), ServiceError> {
        self.next = Deadline::after(PERIOD);
        Ok(())
    }

    fn next_timeout(&self) -> Option<Duration> {
        Some(self.next.remaining())
    }

    async fn on_event(&mut self, msg: &EventMessage<EventId>) -> Result<(), ServiceError> {
        let malformed = || ServiceError::MalformedPayload {
            event: msg.event().name(),
            reason: format!("expected 4 bytes, got {}", msg.payload_len()),
        };
        let bytes: [u8; 4] = msg.payload().try_into().map_err(|_| malformed())?;
        let id = u32::from_le_bytes(bytes);
        self.responses.fetch_add(1, Ordering::Relaxed);
        tracing::info!(responder = id, seq = msg.seq(), "keep-alive answered");
        Ok(())
    }

    async fn on_timeout(&mut self) -> Result<(), ServiceError> {
        self.next.advance(PERIOD);
        if !self.bus.post_empty(EventId::KeepAlive) {
            tracing::warn!("nobody listens for keep-alives");
        }
        Ok(())
    }
}

struct Responder {
    bus: EventBus<EventId>,
    id: u32,
}

#[async_trait]
impl Service for Responder {
    type Event = EventId;

    fn name(&self) -> &str {
        "responder"
    }

    fn subscriptions(&self) -> &[EventId] {
        &[EventId::KeepAlive]
    }

    async fn initialize(&mut self) -> Result<(), ServiceError> {
        Ok(())
    }

    fn next_timeout(&self) -> Option<Duration> {
        None
    }

    async fn on_event(&mut self, _msg: &EventMessage<EventId>) -> Result<(), ServiceError> {
        self.bus.post_event(EventId::KeepAliveResp, &self.id.to_le_bytes());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bus = EventBus::<EventId>::default();
    let mut host = ServiceHost::new(bus.clone());
    let responses = Arc::new(AtomicU64::new(0));

    host.spawn(EventLogger::new(EventId::ALL))?;
    host.spawn(Responder {
        bus: bus.clone(),
        id: 7,
    })?;
    host.spawn(Heartbeat {
        bus: bus.clone(),
        next: Deadline::after(PERIOD),
        responses: Arc::clone(&responses),
    })?;

    tokio::time::sleep(Duration::from_millis(550)).await;
    host.shutdown().await?;

    let stats = bus.stats();
    println!();
    println!("Bus:");
    println!(" ├─► Posted:     {}", stats.posted);
    println!(" ├─► Delivered:  {}", stats.delivered);
    println!(" ├─► Dropped:    {}", stats.dropped());
    println!(" ├─► Reclaimed:  {}", stats.reclaimed);
    println!(" └─► Responses:  {}", responses.load(Ordering::Relaxed));
    Ok(())
}
