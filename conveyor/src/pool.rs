//! Pool of pipeline replicas competing for a shared input stream.

use tokio::task::JoinSet;
use tracing::debug;

use crate::concurrency::stream::{SharedStreamRx, StreamRx};
use crate::conveyor_error;
use crate::error::{ConveyorResult, ErrorKind};
use crate::replica::{PipelineReplica, StageChain};
use crate::sink::ErrorSinkTx;
use crate::transform::Transform;
use crate::types::{ReplicaId, StageItem};

/// Owns the stage tasks of every replica spawned for one pipeline run.
///
/// All replicas read from the same shared input stream; because consumption is
/// competitive, each item is processed by exactly one replica end-to-end and
/// load distributes automatically. The replica count is fixed at spawn time,
/// so the total task count (`replica_count` x 3 stages) is known up front.
///
/// Dropping the pool aborts its tasks; keep it alive until [`wait_all`]
/// resolves.
///
/// [`wait_all`]: ReplicaPool::wait_all
#[derive(Debug)]
pub struct ReplicaPool {
    tasks: JoinSet<()>,
}

impl ReplicaPool {
    /// Spawns `replica_count` replicas of `chain` against the shared input.
    ///
    /// Returns the pool handle and the replicas' output streams in replica
    /// order, for the caller to merge.
    pub fn spawn<A, B, C, D, T1, T2, T3>(
        chain: StageChain<T1, T2, T3>,
        input: SharedStreamRx<A>,
        replica_count: u16,
        errors: &ErrorSinkTx,
        capacity: usize,
    ) -> (ReplicaPool, Vec<StreamRx<D>>)
    where
        A: StageItem,
        B: StageItem,
        C: StageItem,
        D: StageItem,
        T1: Transform<A, B>,
        T2: Transform<B, C>,
        T3: Transform<C, D>,
    {
        let mut tasks = JoinSet::new();
        let mut outputs = Vec::with_capacity(replica_count as usize);

        for replica_id in 0..replica_count {
            let replica = PipelineReplica::new(replica_id as ReplicaId, chain.clone());
            outputs.push(replica.spawn(&mut tasks, input.clone(), errors, capacity));
        }

        debug!(replica_count, "spawned pipeline replicas");

        (ReplicaPool { tasks }, outputs)
    }

    /// Waits for every stage task in the pool to complete.
    ///
    /// Stage tasks finish on their own once the shared input closes; this
    /// method only surfaces panics, aggregated into a single error when more
    /// than one worker failed.
    pub async fn wait_all(mut self) -> ConveyorResult<()> {
        let mut errors = Vec::new();

        while let Some(result) = self.tasks.join_next().await {
            if let Err(join_err) = result {
                if join_err.is_cancelled() {
                    debug!("stage worker task was cancelled");
                } else {
                    errors.push(conveyor_error!(
                        ErrorKind::StageWorkerPanic,
                        "Stage worker panicked",
                        join_err
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}
