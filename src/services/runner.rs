//! # Service run-loop.
//!
//! Drives one [`Service`] against its inbox until the host cancels it.
//!
//! ## State machine
//! ```text
//! Init ──► initialize()
//!   │
//!   ▼
//! Wait(next_timeout()) ──event──► on_event(msg) ──► dispose ──┐
//!   ▲        │                                                │
//!   │        └──elapsed──► on_timeout() ──────────────────────┤
//!   │                                                         ▼
//!   └──────────────────────────────────────────────── on_loop_end()
//! ```
//!
//! ## Rules
//! - **Isolation**: every hook runs under `catch_unwind`; an `Err` is logged at
//!   `warn`, a panic at `error`, both are counted, and the loop continues.
//! - **Dispose always**: the delivery is released after `on_event` whatever the
//!   hook's outcome.
//! - **Teardown**: the host's token is checked at the top of each iteration and
//!   raced against the wait; hooks themselves are never interrupted.
//!
//! **Warning**: `AssertUnwindSafe` is used, so a service that panics while
//! holding one of its own locks may leave that state inconsistent.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::Service;
use crate::core::{BusStats, EventBus, Inbox};
use crate::error::ServiceError;

/// Wait used when `next_timeout` itself panics.
const FALLBACK_WAIT: Duration = Duration::from_secs(1);

/// Runs `service` until `token` is cancelled.
///
/// Registration is the caller's job and must be done before this is spawned.
pub(crate) async fn run_service<S: Service>(
    mut service: S,
    bus: EventBus<S::Event>,
    mut inbox: Inbox<S::Event>,
    token: CancellationToken,
) {
    let name: Arc<str> = service.name().into();
    let stats = bus.stats_handle();

    guarded(stats, &name, "initialize", service.initialize()).await;
    tracing::debug!(service = %name, "service loop started");

    loop {
        if token.is_cancelled() {
            break;
        }

        let wait = match std::panic::catch_unwind(AssertUnwindSafe(|| service.next_timeout())) {
            Ok(wait) => wait,
            Err(panic) => {
                stats.record_handler_panic();
                tracing::error!(
                    service = %name,
                    hook = "next_timeout",
                    info = %panic_info(&*panic),
                    "hook panicked"
                );
                Some(FALLBACK_WAIT)
            }
        };

        let received = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            received = bus.get_event(&mut inbox, wait) => received,
        };

        match received {
            Some(delivery) => {
                guarded(stats, &name, "on_event", service.on_event(delivery.message())).await;
                bus.dispose_event(delivery);
            }
            None => {
                guarded(stats, &name, "on_timeout", service.on_timeout()).await;
            }
        }

        guarded(stats, &name, "on_loop_end", service.on_loop_end()).await;
    }

    tracing::debug!(service = %name, "service loop stopped");
}

/// Awaits a hook, containing both `Err` results and panics.
async fn guarded<F>(stats: &BusStats, service: &str, hook: &'static str, fut: F)
where
    F: Future<Output = Result<(), ServiceError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            stats.record_handler_error();
            tracing::warn!(
                service,
                hook,
                error = e.as_label(),
                detail = %e.as_message(),
                "hook failed"
            );
        }
        Err(panic) => {
            stats.record_handler_panic();
            tracing::error!(service, hook, info = %panic_info(&*panic), "hook panicked");
        }
    }
}

fn panic_info(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
