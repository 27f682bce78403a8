//! Tracing and logging setup shared by every binary and test harness.

/// Subscriber initialization (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, ParseLogFormatError, init};
