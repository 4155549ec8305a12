use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Replica count cannot be zero.
    #[error("`replica_count` cannot be zero")]
    ReplicaCountZero,
    /// Channel capacity cannot be zero.
    #[error("`channel_capacity` cannot be zero")]
    ChannelCapacityZero,
    /// Failure rate must be a probability.
    #[error("`failure_rate` must be between 0.0 and 1.0, got {0}")]
    FailureRateOutOfRange(f64),
    /// Latency range must be ordered.
    #[error("`min_latency_ms` ({min}) cannot exceed `max_latency_ms` ({max})")]
    LatencyRangeInverted { min: u64, max: u64 },
    /// Item count cannot be zero.
    #[error("`item_count` cannot be zero")]
    ItemCountZero,
}
