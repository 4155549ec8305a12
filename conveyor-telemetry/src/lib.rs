//! Telemetry initialization for conveyor binaries.

pub mod tracing;
