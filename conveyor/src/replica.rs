//! Composition of stage processors into one linear pipeline instance.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{Instrument, info_span};

use crate::concurrency::stream::{SharedStreamRx, StreamRx, stream};
use crate::sink::ErrorSinkTx;
use crate::stage::StageProcessor;
use crate::transform::Transform;
use crate::types::{ReplicaId, StageId, StageItem};

/// The three transforms making up a pipeline's stage chain.
///
/// Transforms are reference-counted so that every replica of the chain shares
/// the same instances; cloning a chain is cheap.
#[derive(Debug)]
pub struct StageChain<T1, T2, T3> {
    first: Arc<T1>,
    second: Arc<T2>,
    third: Arc<T3>,
}

impl<T1, T2, T3> StageChain<T1, T2, T3> {
    /// Builds a chain from the three stage transforms.
    pub fn new(first: T1, second: T2, third: T3) -> Self {
        Self {
            first: Arc::new(first),
            second: Arc::new(second),
            third: Arc::new(third),
        }
    }
}

impl<T1, T2, T3> Clone for StageChain<T1, T2, T3> {
    fn clone(&self) -> Self {
        Self {
            first: Arc::clone(&self.first),
            second: Arc::clone(&self.second),
            third: Arc::clone(&self.third),
        }
    }
}

/// One complete instance of the stage chain.
///
/// Chains the three stages by feeding each stage's output stream into the next
/// stage's input, shares one error sink across all of them so failures stay
/// attributable by stage, and exposes only the final output stream. Pure
/// composition; the replica adds no buffering of its own.
#[derive(Debug)]
pub struct PipelineReplica<T1, T2, T3> {
    id: ReplicaId,
    chain: StageChain<T1, T2, T3>,
}

impl<T1, T2, T3> PipelineReplica<T1, T2, T3> {
    /// Creates a replica of the given chain.
    pub fn new(id: ReplicaId, chain: StageChain<T1, T2, T3>) -> Self {
        Self { id, chain }
    }

    /// Spawns the replica's three stage tasks into `tasks`.
    ///
    /// Returns the final output stream. Intermediate streams are owned
    /// entirely by the spawned stages, so closure of the shared `input`
    /// cascades stage by stage until the returned stream closes.
    pub fn spawn<A, B, C, D>(
        self,
        tasks: &mut JoinSet<()>,
        input: SharedStreamRx<A>,
        errors: &ErrorSinkTx,
        capacity: usize,
    ) -> StreamRx<D>
    where
        A: StageItem,
        B: StageItem,
        C: StageItem,
        D: StageItem,
        T1: Transform<A, B>,
        T2: Transform<B, C>,
        T3: Transform<C, D>,
    {
        let (first_tx, first_rx) = stream(capacity);
        let (second_tx, second_rx) = stream(capacity);
        let (output_tx, output_rx) = stream(capacity);

        let first = StageProcessor::new(StageId::FIRST, self.id, Arc::clone(&self.chain.first));
        tasks.spawn(
            first
                .run(input, first_tx, errors.clone())
                .instrument(info_span!("stage_worker", stage = 1, replica_id = self.id)),
        );

        let second = StageProcessor::new(StageId::SECOND, self.id, Arc::clone(&self.chain.second));
        tasks.spawn(
            second
                .run(SharedStreamRx::new(first_rx), second_tx, errors.clone())
                .instrument(info_span!("stage_worker", stage = 2, replica_id = self.id)),
        );

        let third = StageProcessor::new(StageId::THIRD, self.id, Arc::clone(&self.chain.third));
        tasks.spawn(
            third
                .run(SharedStreamRx::new(second_rx), output_tx, errors.clone())
                .instrument(info_span!("stage_worker", stage = 3, replica_id = self.id)),
        );

        output_rx
    }
}
