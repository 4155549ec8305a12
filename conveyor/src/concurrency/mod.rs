//! Concurrency primitives underpinning the pipeline topology.
//!
//! Everything in the pipeline cooperates exclusively through blocking channel
//! operations; there is no shared mutable state beyond the mutex that realizes
//! competitive consumption of the shared input. Stream closure is expressed
//! through sender ownership: a stream is closed exactly when its last sender
//! is dropped, which makes double-close and send-after-close unrepresentable.
//!
//! The [`signal`] module provides the watch-based notification used by
//! callers that want to stop feeding input early, for example on an OS
//! signal. The pipeline itself has no mid-flight cancellation; closing the
//! input is the only shutdown trigger.

pub mod signal;
pub mod stream;
