use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for the simulated transform used by the runner and tests.
///
/// The simulated transform sleeps for a random duration inside the configured
/// latency window and fails each item with probability `failure_rate`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulationConfig {
    /// Probability in `[0.0, 1.0]` that a single item fails at a stage.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
    /// Lower bound of the simulated per-item processing latency, in milliseconds.
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,
    /// Upper bound of the simulated per-item processing latency, in milliseconds.
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
}

impl SimulationConfig {
    /// Default per-item failure probability, matching a ~10% failure rate.
    pub const DEFAULT_FAILURE_RATE: f64 = 0.1;

    /// Default lower latency bound in milliseconds.
    pub const DEFAULT_MIN_LATENCY_MS: u64 = 0;

    /// Default upper latency bound in milliseconds.
    pub const DEFAULT_MAX_LATENCY_MS: u64 = 100;

    /// Returns a configuration with no latency and no failures.
    ///
    /// Useful for deterministic runs where every item must survive.
    pub fn reliable() -> Self {
        Self {
            failure_rate: 0.0,
            min_latency_ms: 0,
            max_latency_ms: 0,
        }
    }

    /// Validates simulation configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ValidationError::FailureRateOutOfRange(self.failure_rate));
        }

        if self.min_latency_ms > self.max_latency_ms {
            return Err(ValidationError::LatencyRangeInverted {
                min: self.min_latency_ms,
                max: self.max_latency_ms,
            });
        }

        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            failure_rate: default_failure_rate(),
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
        }
    }
}

fn default_failure_rate() -> f64 {
    SimulationConfig::DEFAULT_FAILURE_RATE
}

fn default_min_latency_ms() -> u64 {
    SimulationConfig::DEFAULT_MIN_LATENCY_MS
}

fn default_max_latency_ms() -> u64 {
    SimulationConfig::DEFAULT_MAX_LATENCY_MS
}
