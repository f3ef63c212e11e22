//! Observability for docvault
//!
//! Structured JSON logging with explicit severity levels. One log line is
//! one event, keys are emitted in deterministic order, and logging is
//! synchronous. A logging failure must never affect the operation being
//! logged.

mod logger;

pub use logger::{Logger, Severity};
