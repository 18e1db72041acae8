//! Error types used by the bus, the service run-loop and the service host.
//!
//! This module defines three enums:
//!
//! - [`BusError`]: recoverable registration failures reported by the bus.
//! - [`ServiceError`]: failures returned by service hooks (contained by the run-loop).
//! - [`RuntimeError`]: failures of the service host itself, such as a teardown
//!   exceeding its grace period.
//!
//! All of them provide `as_label` (stable snake_case label for logs/metrics) and
//! `as_message` helpers.
//!
//! Contract violations (posting an out-of-range event type, disposing a delivery
//! on the wrong bus) are **not** represented here: they are programming errors and
//! panic at the call site.

use std::time::Duration;
use thiserror::Error;

/// # Errors reported by the event bus.
///
/// Neither variant aborts anything: the attempted subscription simply does not
/// take effect for the affected event types.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// An event type in the request was outside `[0, COUNT)`.
    ///
    /// Validation happens before any mutation, so nothing was registered.
    #[error("invalid argument: event index {index} is outside [0, {count})")]
    InvalidArgument {
        /// Index reported by the offending event type.
        index: usize,
        /// Number of event types the registry was sized for.
        count: usize,
    },

    /// The per-type subscriber limit was reached for one or more event types.
    ///
    /// The endpoint was subscribed to every other type in the request.
    #[error("subscriber limit {limit} reached for {rejected:?}")]
    CapacityExceeded {
        /// The configured per-type limit.
        limit: usize,
        /// Names of the event types the endpoint could not join.
        rejected: Vec<&'static str>,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use svcbus::BusError;
    ///
    /// let err = BusError::InvalidArgument { index: 9, count: 2 };
    /// assert_eq!(err.as_label(), "bus_invalid_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidArgument { .. } => "bus_invalid_argument",
            BusError::CapacityExceeded { .. } => "bus_capacity_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::InvalidArgument { index, count } => {
                format!("event index {index} out of range (count={count})")
            }
            BusError::CapacityExceeded { limit, rejected } => {
                format!("limit={limit}; rejected={rejected:?}")
            }
        }
    }
}

/// # Errors returned by service hooks.
///
/// The run-loop logs these and keeps going; a failing hook never stops the service.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The hook failed; the service keeps running.
    #[error("handler failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The payload attached to an event could not be interpreted.
    #[error("malformed payload for {event}: {reason}")]
    MalformedPayload {
        /// Name of the event type carrying the payload.
        event: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        ServiceError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use svcbus::ServiceError;
    ///
    /// let err = ServiceError::fail("boom");
    /// assert_eq!(err.as_label(), "service_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Fail { .. } => "service_failed",
            ServiceError::MalformedPayload { .. } => "service_malformed_payload",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::Fail { reason } => format!("error: {reason}"),
            ServiceError::MalformedPayload { event, reason } => {
                format!("payload of {event}: {reason}")
            }
        }
    }
}

/// # Errors produced by the service host.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Grace period was exceeded; some service loops did not stop and were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the services that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use svcbus::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck services={stuck:?}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_error_labels() {
        let invalid = BusError::InvalidArgument { index: 7, count: 2 };
        assert_eq!(invalid.as_label(), "bus_invalid_argument");
        assert_eq!(
            invalid.to_string(),
            "invalid argument: event index 7 is outside [0, 2)"
        );

        let full = BusError::CapacityExceeded {
            limit: 10,
            rejected: vec!["KeepAlive"],
        };
        assert_eq!(full.as_label(), "bus_capacity_exceeded");
        assert!(full.as_message().contains("KeepAlive"));
    }

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::MalformedPayload {
            event: "KeepAliveResp",
            reason: "expected 8 bytes".into(),
        };
        assert_eq!(err.as_label(), "service_malformed_payload");
        assert_eq!(
            err.to_string(),
            "malformed payload for KeepAliveResp: expected 8 bytes"
        );
    }
}
