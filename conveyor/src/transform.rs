//! The transform seam between the pipeline and the work it performs.
//!
//! Each stage is handed a [`Transform`] implementation by the caller, so the
//! pipeline machinery stays agnostic of what "processing" means. The transform
//! borrows its input; ownership stays with the stage so that the original item
//! is still available for the failure record when processing fails.

use std::future::Future;
use std::time::Duration;

use conveyor_config::shared::SimulationConfig;
use rand::Rng;

use crate::types::{StageItem, TransformError};

/// Transformation applied by one pipeline stage.
///
/// Implementations must preserve item identity: `output.id() == input.id()`
/// for every successful application.
pub trait Transform<In, Out>: Send + Sync + 'static
where
    In: StageItem,
    Out: StageItem,
{
    /// Transforms one item, or reports why it cannot be transformed.
    fn apply(&self, input: &In) -> impl Future<Output = Result<Out, TransformError>> + Send;
}

/// Adapter turning a plain synchronous closure into a [`Transform`].
#[derive(Debug, Clone)]
pub struct FnTransform<F> {
    f: F,
}

/// Wraps a closure of shape `Fn(&In) -> Result<Out, TransformError>` as a stage transform.
pub fn transform_fn<F>(f: F) -> FnTransform<F> {
    FnTransform { f }
}

impl<In, Out, F> Transform<In, Out> for FnTransform<F>
where
    In: StageItem,
    Out: StageItem,
    F: Fn(&In) -> Result<Out, TransformError> + Send + Sync + 'static,
{
    async fn apply(&self, input: &In) -> Result<Out, TransformError> {
        (self.f)(input)
    }
}

/// Reference transform that simulates variable latency and random failures.
///
/// Each application sleeps for a uniformly random duration inside the
/// configured latency window, then fails with probability `failure_rate`. The
/// payload mapping is supplied as a closure so the same simulation drives any
/// pair of item types. A `failure_rate` of 0.0 or 1.0 makes the outcome
/// deterministic, which the test scenarios rely on.
#[derive(Debug, Clone)]
pub struct SimulatedTransform<M> {
    failure_rate: f64,
    min_latency: Duration,
    max_latency: Duration,
    map: M,
}

impl<M> SimulatedTransform<M> {
    /// Creates a simulated transform from its configuration and payload mapping.
    pub fn new(config: &SimulationConfig, map: M) -> Self {
        Self {
            failure_rate: config.failure_rate,
            min_latency: Duration::from_millis(config.min_latency_ms),
            max_latency: Duration::from_millis(config.max_latency_ms),
            map,
        }
    }
}

impl<In, Out, M> Transform<In, Out> for SimulatedTransform<M>
where
    In: StageItem,
    Out: StageItem,
    M: Fn(&In) -> Out + Send + Sync + 'static,
{
    async fn apply(&self, input: &In) -> Result<Out, TransformError> {
        // Draw both outcomes before suspending; the rng handle must not be
        // held across an await point.
        let (latency, failed) = {
            let mut rng = rand::thread_rng();
            let latency = if self.max_latency.is_zero() {
                Duration::ZERO
            } else {
                rng.gen_range(self.min_latency..=self.max_latency)
            };
            let failed = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
            (latency, failed)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if failed {
            return Err(TransformError::new(format!(
                "simulated processing failure for item {}",
                input.id()
            )));
        }

        Ok((self.map)(input))
    }
}
