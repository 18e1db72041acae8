//! # Bus and host configuration.
//!
//! Provides [`Config`], the centralized settings shared by
//! [`EventBus`](crate::EventBus) and [`ServiceHost`](crate::ServiceHost).
//!
//! ## Sentinel values
//! - `max_subscribers = 0` → unbounded, duplicate-free subscriber lists
//! - `inbox_capacity = 0` → clamped to 1

use std::time::Duration;

/// Subscriber limit used by [`Config::embedded`].
pub const MAX_EVENT_SUBS: usize = 10;

/// Default capacity of a service inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 20;

/// Global configuration for a bus and the services hosted on it.
///
/// ## Field semantics
/// - `inbox_capacity`: default bounded-queue size for service inboxes (min 1)
/// - `max_subscribers`: per-event-type subscriber limit (`0` = unbounded)
/// - `grace`: how long [`ServiceHost::shutdown`](crate::ServiceHost::shutdown)
///   waits for loops to finish before aborting them
///
/// ## Notes
/// All fields are public. Prefer the accessors to avoid sprinkling sentinel
/// checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Default capacity of each service inbox.
    ///
    /// A full inbox makes posts drop the delivery for that service only.
    pub inbox_capacity: usize,

    /// Maximum number of endpoints per event type.
    ///
    /// - `0` = unbounded
    /// - `n > 0` = registration beyond `n` fails with
    ///   [`BusError::CapacityExceeded`](crate::BusError::CapacityExceeded)
    pub max_subscribers: usize,

    /// Maximum time to wait for service loops to stop during teardown.
    pub grace: Duration,
}

impl Config {
    /// Bounded preset for memory-constrained nodes: at most
    /// [`MAX_EVENT_SUBS`] subscribers per event type.
    pub fn embedded() -> Self {
        Self {
            max_subscribers: MAX_EVENT_SUBS,
            ..Self::default()
        }
    }

    /// Returns the subscriber limit as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` endpoints per event type
    #[inline]
    pub fn subscriber_limit(&self) -> Option<usize> {
        if self.max_subscribers == 0 {
            None
        } else {
            Some(self.max_subscribers)
        }
    }

    /// Returns the inbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn inbox_capacity_clamped(&self) -> usize {
        self.inbox_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `inbox_capacity = 20`
    /// - `max_subscribers = 0` (unbounded)
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            max_subscribers: 0,
            grace: Duration::from_secs(5),
        }
    }
}
