use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for a conveyor pipeline.
///
/// Contains the settings that shape the concurrency topology: how many
/// replicas of the stage chain compete for input and how much slack the
/// connecting channels have.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Number of pipeline replicas pulling from the shared input.
    #[serde(default = "default_replica_count")]
    pub replica_count: u16,
    /// Capacity of every channel connecting stages, replicas, and the fan-in.
    ///
    /// The default of 1 approximates direct hand-off between tasks; raising it
    /// trades memory for throughput smoothing.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl PipelineConfig {
    /// Default number of pipeline replicas.
    pub const DEFAULT_REPLICA_COUNT: u16 = 5;

    /// Default channel capacity.
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

    /// Validates pipeline configuration settings.
    ///
    /// Ensures the replica count and channel capacity are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.replica_count == 0 {
            return Err(ValidationError::ReplicaCountZero);
        }

        if self.channel_capacity == 0 {
            return Err(ValidationError::ChannelCapacityZero);
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            replica_count: default_replica_count(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_replica_count() -> u16 {
    PipelineConfig::DEFAULT_REPLICA_COUNT
}

fn default_channel_capacity() -> usize {
    PipelineConfig::DEFAULT_CHANNEL_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_replica_count_is_rejected() {
        let config = PipelineConfig {
            replica_count: 0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::ReplicaCountZero)
        ));
    }

    #[test]
    fn zero_channel_capacity_is_rejected() {
        let config = PipelineConfig {
            channel_capacity: 0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::ChannelCapacityZero)
        ));
    }
}
