//! # Event messages.
//!
//! [`EventMessage`] is the immutable record every subscriber observes: the event
//! type, a per-bus sequence number, a wall-clock timestamp and an optional owned
//! payload.
//!
//! ## Payload ownership
//! - Construction copies the caller's bytes; the caller may reuse its buffer
//!   immediately afterwards.
//! - An empty payload allocates nothing.
//! - `Clone` deep-copies the payload.
//!
//! ## Example
//! ```rust
//! use svcbus::{EventId, EventMessage};
//!
//! let mut buf = vec![1u8, 2, 3];
//! let msg = EventMessage::new(EventId::KeepAliveResp, 0, &buf);
//! buf[0] = 42;
//!
//! assert_eq!(msg.payload(), &[1, 2, 3]);
//! assert!(msg.has_payload());
//! ```

use std::time::SystemTime;

use super::kind::EventType;

/// Immutable event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage<E> {
    event: E,
    seq: u64,
    at: SystemTime,
    payload: Option<Box<[u8]>>,
}

impl<E: EventType> EventMessage<E> {
    /// Creates a message stamped with the current time, copying `payload`.
    pub fn new(event: E, seq: u64, payload: &[u8]) -> Self {
        Self {
            event,
            seq,
            at: SystemTime::now(),
            payload: (!payload.is_empty()).then(|| Box::from(payload)),
        }
    }

    /// Event type of this message.
    #[inline]
    pub fn event(&self) -> E {
        self.event
    }

    /// Per-bus post sequence number (monotonic, starts at 0).
    ///
    /// Routed posts are numbered in the order they are fanned out, so every
    /// inbox yields increasing values.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Wall-clock creation time.
    #[inline]
    pub fn created_at(&self) -> SystemTime {
        self.at
    }

    /// Payload bytes; empty when the event carries no data.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or(&[])
    }

    /// Payload length in bytes.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, |p| p.len())
    }

    /// True if a payload buffer is attached.
    #[inline]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}
