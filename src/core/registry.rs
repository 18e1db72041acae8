//! # Subscription registry.
//!
//! Maps each event type to the ordered, duplicate-free list of endpoints
//! subscribed to it.
//!
//! ## Architecture
//! ```text
//! slots: RwLock<[Vec<Endpoint>; E::COUNT]>
//!          │
//!          ├─ [KeepAlive]     → [svc-a, svc-b]
//!          └─ [KeepAliveResp] → [svc-a]
//! ```
//!
//! ## Rules
//! - An endpoint appears at most once per event type (registration is idempotent).
//! - Every read and mutation holds the lock; posts read under the read lock,
//!   registration/reset take the write lock.
//! - Out-of-range event types are rejected before anything is mutated.
//! - With a limit configured, a full slot rejects that event type only.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::inbox::Endpoint;
use crate::error::BusError;
use crate::events::EventType;

/// Event-type-indexed table of subscriber endpoints.
pub(crate) struct SubscriptionRegistry<E: EventType> {
    slots: RwLock<Vec<Vec<Endpoint<E>>>>,
    limit: Option<usize>,
}

impl<E: EventType> SubscriptionRegistry<E> {
    /// Creates an empty registry; `limit = None` means unbounded slots.
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            slots: RwLock::new((0..E::COUNT).map(|_| Vec::new()).collect()),
            limit,
        }
    }

    /// Adds `endpoint` to the slot of every type in `events`.
    ///
    /// Already-present subscriptions are left untouched. Returns
    /// [`BusError::InvalidArgument`] (nothing registered) for an out-of-range type,
    /// or [`BusError::CapacityExceeded`] listing the types whose slot was full
    /// (all other types were registered).
    pub(crate) fn register(&self, endpoint: &Endpoint<E>, events: &[E]) -> Result<(), BusError> {
        if let Some(bad) = events.iter().find(|e| e.index() >= E::COUNT) {
            return Err(BusError::InvalidArgument {
                index: bad.index(),
                count: E::COUNT,
            });
        }

        let mut slots = self.write();
        let mut rejected = Vec::new();

        for &event in events {
            let subs = &mut slots[event.index()];
            if subs.contains(endpoint) {
                continue;
            }
            match self.limit {
                Some(limit) if subs.len() >= limit => rejected.push(event.name()),
                _ => subs.push(endpoint.clone()),
            }
        }

        match self.limit {
            Some(limit) if !rejected.is_empty() => {
                Err(BusError::CapacityExceeded { limit, rejected })
            }
            _ => Ok(()),
        }
    }

    /// Removes `endpoint` from every slot; returns how many subscriptions were dropped.
    pub(crate) fn unregister(&self, endpoint: &Endpoint<E>) -> usize {
        let mut slots = self.write();
        let mut removed = 0;
        for subs in slots.iter_mut() {
            let before = subs.len();
            subs.retain(|ep| ep != endpoint);
            removed += before - subs.len();
        }
        removed
    }

    /// Membership test; out-of-range types are never subscribed.
    pub(crate) fn is_subscribed(&self, endpoint: &Endpoint<E>, event: E) -> bool {
        self.read()
            .get(event.index())
            .is_some_and(|subs| subs.contains(endpoint))
    }

    /// Number of endpoints subscribed to `event`.
    pub(crate) fn subscriber_count(&self, event: E) -> usize {
        self.read().get(event.index()).map_or(0, Vec::len)
    }

    /// Clears the slot of one event type.
    pub(crate) fn reset(&self, event: E) {
        if let Some(subs) = self.write().get_mut(event.index()) {
            subs.clear();
        }
    }

    /// Clears every slot.
    pub(crate) fn reset_all(&self) {
        for subs in self.write().iter_mut() {
            subs.clear();
        }
    }

    /// Runs `f` over the subscribers of `event` while holding the read lock.
    ///
    /// The caller must have checked that `event` is in range.
    pub(crate) fn with_subscribers<R>(&self, event: E, f: impl FnOnce(&[Endpoint<E>]) -> R) -> R {
        let slots = self.read();
        f(&slots[event.index()])
    }

    // Slot vectors have no partially-updated state, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Vec<Endpoint<E>>>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Vec<Endpoint<E>>>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}
