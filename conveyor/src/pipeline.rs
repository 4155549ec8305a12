//! Top-level wiring of the pipeline topology.

use std::sync::Arc;

use conveyor_config::shared::PipelineConfig;
use tracing::info;

use crate::concurrency::stream::{MergedStream, SharedStreamRx, StreamRx};
use crate::conveyor_error;
use crate::error::{ConveyorResult, ErrorKind};
use crate::fanin::{FanInHandle, fan_in};
use crate::pool::ReplicaPool;
use crate::replica::StageChain;
use crate::sink::ErrorSinkTx;
use crate::transform::Transform;
use crate::types::StageItem;

/// A configured but not yet running pipeline.
///
/// Wiring order matters and is owned by [`start`]: the caller creates the
/// error sink and starts its drainer first, then starts the pipeline, then
/// feeds input. Shutdown is input-exhaustion driven; dropping the input
/// sender is the only trigger, and closure cascades stage by stage until the
/// merged output closes.
///
/// [`start`]: Pipeline::start
#[derive(Debug)]
pub struct Pipeline<T1, T2, T3> {
    config: Arc<PipelineConfig>,
    chain: StageChain<T1, T2, T3>,
}

impl<T1, T2, T3> Pipeline<T1, T2, T3> {
    /// Creates a pipeline from its configuration and stage chain.
    pub fn new(config: PipelineConfig, chain: StageChain<T1, T2, T3>) -> Self {
        Self {
            config: Arc::new(config),
            chain,
        }
    }

    /// Starts the pipeline against the given input stream.
    ///
    /// Spawns the replica pool and the fan-in, then hands back the merged
    /// output stream and a handle covering every spawned task. The `errors`
    /// sender is consumed: each stage task holds its own clone, so the sink
    /// closes exactly when the last stage finishes, and the drainer can never
    /// outlive a producer.
    pub fn start<A, B, C, D>(
        self,
        input: StreamRx<A>,
        errors: ErrorSinkTx,
    ) -> ConveyorResult<(MergedStream<D>, PipelineHandle)>
    where
        A: StageItem,
        B: StageItem,
        C: StageItem,
        D: StageItem,
        T1: Transform<A, B>,
        T2: Transform<B, C>,
        T3: Transform<C, D>,
    {
        self.config.validate().map_err(|err| {
            conveyor_error!(
                ErrorKind::ConfigError,
                "Invalid pipeline configuration",
                source: err
            )
        })?;

        info!(
            replica_count = self.config.replica_count,
            channel_capacity = self.config.channel_capacity,
            "starting pipeline"
        );

        let (pool, outputs) = ReplicaPool::spawn(
            self.chain,
            SharedStreamRx::new(input),
            self.config.replica_count,
            &errors,
            self.config.channel_capacity,
        );

        // The stage tasks hold the only remaining sink senders from here on.
        drop(errors);

        let (merged, fan_in) = fan_in(outputs, self.config.channel_capacity);

        Ok((merged, PipelineHandle { pool, fan_in }))
    }
}

/// Handle covering every task spawned for one pipeline run.
///
/// Must be kept alive while the merged output is being drained; dropping it
/// aborts the pipeline's tasks.
#[derive(Debug)]
pub struct PipelineHandle {
    pool: ReplicaPool,
    fan_in: FanInHandle,
}

impl PipelineHandle {
    /// Waits for every stage task and fan-in forwarder to complete.
    ///
    /// The replica pool is joined before the fan-in: stage completion is what
    /// releases the forwarders' sources, so this order cannot deadlock as
    /// long as the merged output has been drained. Worker panics from both
    /// groups are aggregated into a single error.
    pub async fn wait(self) -> ConveyorResult<()> {
        let mut errors = Vec::new();

        if let Err(err) = self.pool.wait_all().await {
            errors.push(err);
        }

        if let Err(err) = self.fan_in.wait().await {
            errors.push(err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}
