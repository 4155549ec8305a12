//! Shared configuration types for conveyor pipelines.

mod base;
mod pipeline;
mod runner;
mod simulation;

pub use base::ValidationError;
pub use pipeline::PipelineConfig;
pub use runner::RunnerConfig;
pub use simulation::SimulationConfig;
