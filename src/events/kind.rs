//! # Event type domain.
//!
//! An event type is a small, totally ordered, build-time-fixed set of
//! identifiers. The bus sizes its subscription table with [`EventType::COUNT`]
//! and addresses it with [`EventType::index`].
//!
//! Any field-less `enum` can implement the trait:
//!
//! ```rust
//! use svcbus::EventType;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Sensor {
//!     Sample,
//!     Calibrated,
//! }
//!
//! impl EventType for Sensor {
//!     const COUNT: usize = 2;
//!
//!     fn index(self) -> usize {
//!         self as usize
//!     }
//!
//!     fn name(self) -> &'static str {
//!         match self {
//!             Sensor::Sample => "Sample",
//!             Sensor::Calibrated => "Calibrated",
//!         }
//!     }
//! }
//!
//! assert_eq!(Sensor::Calibrated.index(), 1);
//! ```

use std::fmt::Debug;

/// Contract for event identifiers.
///
/// ### Rules
/// - `index()` must be `< COUNT` for every value; an index outside that range is
///   rejected at registration and is a fatal contract violation at post time.
/// - No identifier may be reused for two semantically different messages.
pub trait EventType: Copy + Eq + Debug + Send + Sync + 'static {
    /// Number of distinct event types.
    const COUNT: usize;

    /// Position of this event type in `[0, COUNT)`.
    fn index(self) -> usize;

    /// Human-readable name of this value (for logs/metrics).
    ///
    /// Must tell variants apart: it is what drop warnings and
    /// [`BusError::CapacityExceeded`](crate::BusError::CapacityExceeded) report.
    fn name(self) -> &'static str;
}

/// Built-in event identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventId {
    /// Sent to a service periodically to see if it is still functional.
    KeepAlive,
    /// Response to a keep-alive. The payload carries the responder's id.
    KeepAliveResp,
}

impl EventId {
    /// All identifiers, in index order.
    pub const ALL: [EventId; 2] = [EventId::KeepAlive, EventId::KeepAliveResp];
}

impl EventType for EventId {
    const COUNT: usize = Self::ALL.len();

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            EventId::KeepAlive => "KeepAlive",
            EventId::KeepAliveResp => "KeepAliveResp",
        }
    }
}
