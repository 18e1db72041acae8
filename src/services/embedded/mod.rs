//! # Built-in services
//!
//! Small, self-contained services useful for demos and debugging.
//!
//! - [`EventLogger`]: logs every message of the chosen event types.

mod log;

pub use log::EventLogger;
