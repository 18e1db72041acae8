//! # Bus counters.
//!
//! [`BusStats`] counts what happened to posted events so that a monitoring layer
//! can observe event loss without the producer ever seeing an error.
//!
//! ## Counters
//! ```text
//! posted          every post_event call that found at least one subscriber
//! unrouted        post_event calls with no subscriber (nothing allocated)
//! delivered       successful enqueues (one per subscriber per post)
//! dropped_full    enqueues refused because the inbox was full
//! dropped_closed  enqueues refused because the inbox was gone
//! reclaimed       distribution items whose last share was released
//! handler_errors  service hooks that returned Err
//! handler_panics  service hooks that panicked
//! ```
//!
//! Invariant once every delivery has been disposed:
//! `reclaimed == posted` and `delivered + dropped_full + dropped_closed == Σ fan-out`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by a bus, its deliveries and its service loops.
#[derive(Debug, Default)]
pub struct BusStats {
    posted: AtomicU64,
    unrouted: AtomicU64,
    delivered: AtomicU64,
    dropped_full: AtomicU64,
    dropped_closed: AtomicU64,
    reclaimed: AtomicU64,
    handler_errors: AtomicU64,
    handler_panics: AtomicU64,
}

/// Point-in-time copy of [`BusStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub posted: u64,
    pub unrouted: u64,
    pub delivered: u64,
    pub dropped_full: u64,
    pub dropped_closed: u64,
    pub reclaimed: u64,
    pub handler_errors: u64,
    pub handler_panics: u64,
}

impl StatsSnapshot {
    /// Total deliveries lost to full or closed inboxes.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped_full + self.dropped_closed
    }
}

impl BusStats {
    /// Reads every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            posted: self.posted.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            dropped_closed: self.dropped_closed.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn record_posted(&self) {
        self.posted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_unrouted(&self) {
        self.unrouted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped_full(&self) {
        self.dropped_full.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped_closed(&self) {
        self.dropped_closed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_reclaimed(&self) {
        self.reclaimed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_handler_panic(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }
}
