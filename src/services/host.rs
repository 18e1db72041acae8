//! # ServiceHost: one task per service, registered before it runs.
//!
//! [`ServiceHost`] owns the run-loop tasks of every service attached to one
//! [`EventBus`]. It creates each service's inbox, registers the subscriptions
//! synchronously, and only then spawns the loop, so nothing posted after
//! [`ServiceHost::spawn`] returns can miss the new service.
//!
//! ## Diagram
//! ```text
//! spawn(svc)
//!   ├─► Inbox::new(svc.name(), capacity)
//!   ├─► bus.register_endpoint(endpoint, svc.subscriptions())
//!   │      ├─ InvalidArgument   → Err, nothing spawned
//!   │      └─ CapacityExceeded  → warn, spawn with partial subscriptions
//!   └─► tokio::spawn(run_service(svc, bus, inbox, child_token))
//!
//! shutdown()
//!   ├─► token.cancel()              → loops exit at their next wait
//!   ├─► unregister every endpoint   → posts stop targeting them
//!   └─► join within cfg.grace:
//!          ├─ all joined  → Ok(())
//!          └─ stragglers  → abort, Err(GraceExceeded { stuck })
//! ```
//!
//! Dropping the host without calling [`shutdown`](ServiceHost::shutdown)
//! detaches the loops; they keep running until the runtime stops.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::{Deadline, Service, runner::run_service};
use crate::core::{Endpoint, EventBus, Inbox};
use crate::error::{BusError, RuntimeError};
use crate::events::EventType;

/// A spawned service loop.
struct Hosted<E: EventType> {
    name: Arc<str>,
    endpoint: Endpoint<E>,
    join: JoinHandle<()>,
}

/// Spawns and tears down service run-loops on one bus.
pub struct ServiceHost<E: EventType> {
    bus: EventBus<E>,
    token: CancellationToken,
    services: Vec<Hosted<E>>,
}

impl<E: EventType> ServiceHost<E> {
    /// Creates an empty host for `bus`.
    pub fn new(bus: EventBus<E>) -> Self {
        Self {
            bus,
            token: CancellationToken::new(),
            services: Vec::new(),
        }
    }

    /// The bus services are attached to.
    pub fn bus(&self) -> &EventBus<E> {
        &self.bus
    }

    /// Registers `service` on the bus and starts its run-loop.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// ### Errors
    /// [`BusError::InvalidArgument`] if a subscription is out of range; the service
    /// is not started. A [`BusError::CapacityExceeded`] is logged and the service
    /// runs with the subscriptions that did take effect.
    pub fn spawn<S>(&mut self, service: S) -> Result<(), BusError>
    where
        S: Service<Event = E>,
    {
        let name: Arc<str> = service.name().into();
        let capacity = service
            .inbox_capacity()
            .unwrap_or_else(|| self.bus.config().inbox_capacity_clamped());
        let inbox = Inbox::new(Arc::clone(&name), capacity);
        let endpoint = inbox.endpoint();

        if let Err(e) = self.bus.register_endpoint(&endpoint, service.subscriptions()) {
            if matches!(e, BusError::InvalidArgument { .. }) {
                return Err(e);
            }
        }

        let join = tokio::spawn(run_service(
            service,
            self.bus.clone(),
            inbox,
            self.token.child_token(),
        ));
        tracing::info!(service = %name, capacity, "service spawned");

        self.services.push(Hosted {
            name,
            endpoint,
            join,
        });
        Ok(())
    }

    /// Number of hosted services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// True if no service has been spawned.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Names of hosted services, in spawn order.
    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name.to_string()).collect()
    }

    /// Stops every loop, waiting up to the configured grace period.
    ///
    /// Loops still running when the grace period ends are aborted and reported
    /// in [`RuntimeError::GraceExceeded`].
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        let grace = self.bus.config().grace;
        let deadline = Deadline::after(grace).instant();
        self.token.cancel();

        for svc in &self.services {
            self.bus.unregister_endpoint(&svc.endpoint);
        }

        let mut stuck = Vec::new();
        for mut svc in self.services {
            match time::timeout_at(deadline, &mut svc.join).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    tracing::error!(service = %svc.name, error = %join_err, "service task failed");
                }
                Err(_elapsed) => {
                    svc.join.abort();
                    stuck.push(svc.name.to_string());
                }
            }
        }

        if stuck.is_empty() {
            tracing::info!("all services stopped within grace");
            Ok(())
        } else {
            tracing::error!(?grace, ?stuck, "grace exceeded; aborting services");
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }

    /// Waits for a termination signal, then [`shutdown`](Self::shutdown).
    pub async fn run_until_signal(self) -> Result<(), RuntimeError> {
        if let Err(e) = wait_for_shutdown_signal().await {
            tracing::warn!(error = %e, "signal handler unavailable; shutting down");
        } else {
            tracing::info!("shutdown requested");
        }
        self.shutdown().await
    }
}

/// Completes on SIGINT, SIGTERM or SIGQUIT.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Completes on Ctrl-C.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::config::Config;
    use crate::error::ServiceError;
    use crate::events::{EventId, EventMessage};

    struct Echo {
        seen: mpsc::UnboundedSender<u64>,
        hang: bool,
    }

    #[async_trait]
    impl Service for Echo {
        type Event = EventId;

        fn name(&self) -> &str {
            "echo"
        }

        fn subscriptions(&self) -> &[EventId] {
            &[EventId::KeepAlive]
        }

        fn inbox_capacity(&self) -> Option<usize> {
            Some(2)
        }

        async fn initialize(&mut self) -> Result<(), ServiceError> {
            Ok(())
        }

        fn next_timeout(&self) -> Option<Duration> {
            None
        }

        async fn on_event(&mut self, msg: &EventMessage<EventId>) -> Result<(), ServiceError> {
            let _ = self.seen.send(msg.seq());
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Broken;

    impl EventType for Broken {
        const COUNT: usize = 1;

        fn index(self) -> usize {
            3
        }

        fn name(self) -> &'static str {
            "Broken"
        }
    }

    struct Misconfigured;

    #[async_trait]
    impl Service for Misconfigured {
        type Event = Broken;

        fn subscriptions(&self) -> &[Broken] {
            &[Broken]
        }

        async fn initialize(&mut self) -> Result<(), ServiceError> {
            Ok(())
        }

        fn next_timeout(&self) -> Option<Duration> {
            None
        }

        async fn on_event(&mut self, _msg: &EventMessage<Broken>) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_registers_before_returning() {
        let mut host = ServiceHost::new(EventBus::<EventId>::default());
        let (tx, mut seen) = mpsc::unbounded_channel();

        host.spawn(Echo { seen: tx, hang: false }).unwrap();

        // no yield yet: the subscription must already be live
        assert_eq!(host.bus().subscriber_count(EventId::KeepAlive), 1);
        assert!(host.bus().post_empty(EventId::KeepAlive));
        assert_eq!(seen.recv().await, Some(0));

        assert_eq!(host.names(), vec!["echo"]);
        let bus = host.bus().clone();
        host.shutdown().await.unwrap();
        assert_eq!(bus.subscriber_count(EventId::KeepAlive), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_inbox_capacity_is_used() {
        let mut host = ServiceHost::new(EventBus::<EventId>::default());
        let (tx, mut seen) = mpsc::unbounded_channel();
        host.spawn(Echo { seen: tx, hang: true }).unwrap();

        host.bus().post_empty(EventId::KeepAlive);
        assert_eq!(seen.recv().await, Some(0));

        // the loop is stuck in on_event; two more fit in the inbox, the third drops
        for _ in 0..3 {
            host.bus().post_empty(EventId::KeepAlive);
        }
        assert_eq!(host.bus().stats().dropped_full, 1);

        let _ = host.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_exceeded_reports_stuck_services() {
        let cfg = Config {
            grace: Duration::from_millis(200),
            ..Config::default()
        };
        let mut host = ServiceHost::new(EventBus::<EventId>::new(cfg));
        let (tx, mut seen) = mpsc::unbounded_channel();
        host.spawn(Echo { seen: tx, hang: true }).unwrap();

        host.bus().post_empty(EventId::KeepAlive);
        assert_eq!(seen.recv().await, Some(0));

        let err = host.shutdown().await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_millis(200));
                assert_eq!(stuck, vec!["echo".to_string()]);
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_subscription_is_not_spawned() {
        let mut host = ServiceHost::new(EventBus::<Broken>::default());

        let err = host.spawn(Misconfigured).unwrap_err();
        assert_eq!(err.as_label(), "bus_invalid_argument");
        assert!(host.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_exceeded_still_spawns() {
        let cfg = Config {
            max_subscribers: 1,
            ..Config::default()
        };
        let mut host = ServiceHost::new(EventBus::<EventId>::new(cfg));
        let (tx, _seen) = mpsc::unbounded_channel();

        host.spawn(Echo { seen: tx.clone(), hang: false }).unwrap();
        host.spawn(Echo { seen: tx, hang: false }).unwrap();

        assert_eq!(host.len(), 2);
        assert_eq!(host.bus().subscriber_count(EventId::KeepAlive), 1);
        host.shutdown().await.unwrap();
    }
}
