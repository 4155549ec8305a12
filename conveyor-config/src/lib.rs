//! Configuration types and loading for conveyor pipelines.

pub mod environment;
pub mod load;
pub mod shared;
