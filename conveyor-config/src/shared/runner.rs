use serde::{Deserialize, Serialize};

use crate::shared::{PipelineConfig, SimulationConfig, ValidationError};

/// Configuration for the conveyor runner binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Number of items the runner feeds into the pipeline before closing the input.
    #[serde(default = "default_item_count")]
    pub item_count: u64,
    /// Pipeline topology settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Simulated transform settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl RunnerConfig {
    /// Default number of items fed by the runner.
    pub const DEFAULT_ITEM_COUNT: u64 = 1000;

    /// Validates the runner configuration and all nested sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.item_count == 0 {
            return Err(ValidationError::ItemCountZero);
        }

        self.pipeline.validate()?;
        self.simulation.validate()?;

        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            item_count: default_item_count(),
            pipeline: PipelineConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

fn default_item_count() -> u64 {
    RunnerConfig::DEFAULT_ITEM_COUNT
}
