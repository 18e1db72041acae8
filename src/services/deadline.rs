//! # Wake-up deadlines for service timeouts.
//!
//! [`Deadline`] turns an absolute wake-up point into the "remaining time" that
//! [`Service::next_timeout`](crate::Service::next_timeout) reports. It ticks
//! down as time passes and saturates at zero once due.
//!
//! Built on [`tokio::time::Instant`], so it follows a paused test clock.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use svcbus::Deadline;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut next = Deadline::after(Duration::from_millis(100));
//! assert!(!next.is_due());
//! assert!(next.remaining() <= Duration::from_millis(100));
//!
//! next.advance(Duration::from_millis(100));
//! assert!(next.remaining() > Duration::from_millis(100));
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;

/// Absolute wake-up point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `d` from now. Durations too large to represent saturate far in
    /// the future, so `Duration::MAX` works as "never".
    pub fn after(d: Duration) -> Self {
        Self {
            at: later(Instant::now(), d),
        }
    }

    /// Deadline at an absolute instant.
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// The absolute instant.
    #[inline]
    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left until the deadline; zero once it has passed.
    #[inline]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// True once the deadline has passed.
    #[inline]
    pub fn is_due(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Moves the deadline to `d` from now.
    pub fn reset(&mut self, d: Duration) {
        self.at = later(Instant::now(), d);
    }

    /// Moves the deadline forward by `period` from its previous value.
    ///
    /// Unlike [`reset`](Self::reset), this does not accumulate drift for
    /// periodic wake-ups.
    pub fn advance(&mut self, period: Duration) {
        self.at = later(self.at, period);
    }
}

/// `base + d`, saturating at roughly 30 years out instead of overflowing.
fn later(base: Instant, d: Duration) -> Instant {
    base.checked_add(d).unwrap_or_else(|| far_future().max(base))
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}
