//! Single-stage processing loop.

use std::sync::Arc;

use tracing::{debug, error};

use crate::concurrency::stream::{SharedStreamRx, StreamTx};
use crate::sink::ErrorSinkTx;
use crate::transform::Transform;
use crate::types::{ReplicaId, StageFailure, StageId, StageItem};

/// One stage instance: a transform bound to its position in the chain.
///
/// Each instance runs as its own task and owns exactly one item at a time.
/// Every item pulled from the input exits as exactly one transformed item on
/// the output or exactly one [`StageFailure`] on the error sink, never both.
#[derive(Debug)]
pub struct StageProcessor<T> {
    stage: StageId,
    replica_id: ReplicaId,
    transform: Arc<T>,
}

impl<T> StageProcessor<T> {
    /// Creates a stage processor for the given chain position and replica.
    pub fn new(stage: StageId, replica_id: ReplicaId, transform: Arc<T>) -> Self {
        Self {
            stage,
            replica_id,
            transform,
        }
    }

    /// Consumes the input stream until it is closed and drained.
    ///
    /// Failed items are reported to the error sink and dropped from the
    /// success path; they are never retried or forwarded. The send to the sink
    /// blocks, so a drainer must be running for the pipeline's lifetime. The
    /// output stream closes exactly once, when this method returns and the
    /// sender is dropped, regardless of how many items failed.
    pub async fn run<In, Out>(
        self,
        input: SharedStreamRx<In>,
        output: StreamTx<Out>,
        errors: ErrorSinkTx,
    ) where
        In: StageItem,
        Out: StageItem,
        T: Transform<In, Out>,
    {
        while let Some(item) = input.recv().await {
            match self.transform.apply(&item).await {
                Ok(next) => {
                    if output.send(next).await.is_err() {
                        // The downstream receiver is gone, which only happens
                        // when the consumer was dropped without draining.
                        error!(
                            stage = %self.stage,
                            replica_id = self.replica_id,
                            "output stream closed with items still in flight, stopping stage"
                        );
                        return;
                    }
                }
                Err(cause) => {
                    debug!(
                        stage = %self.stage,
                        replica_id = self.replica_id,
                        item_id = item.id(),
                        "item failed transformation, reporting to error sink"
                    );
                    errors
                        .report(StageFailure::new(self.stage, item, cause))
                        .await;
                }
            }
        }

        debug!(
            stage = %self.stage,
            replica_id = self.replica_id,
            "input exhausted, closing stage output"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::stream::stream;
    use crate::sink::error_sink;
    use crate::test_utils::{TestItem, fail_ids, passthrough};

    #[tokio::test]
    async fn routes_each_item_to_exactly_one_side() {
        let (input_tx, input_rx) = stream(1);
        let (output_tx, mut output_rx) = stream(16);
        let (errors_tx, mut errors_rx) = error_sink(16);

        let processor = StageProcessor::new(
            StageId::FIRST,
            0,
            Arc::new(fail_ids([2, 4])),
        );
        let worker = tokio::spawn(processor.run(SharedStreamRx::new(input_rx), output_tx, errors_tx));

        for id in 0..6 {
            input_tx.send(TestItem::new(id)).await.unwrap();
        }
        drop(input_tx);
        worker.await.unwrap();

        let mut forwarded = Vec::new();
        while let Some(item) = output_rx.recv().await {
            forwarded.push(item.id());
        }
        assert_eq!(forwarded, vec![0, 1, 3, 5]);

        let mut failed = Vec::new();
        while let Some(failure) = errors_rx.recv().await {
            assert_eq!(failure.stage, StageId::FIRST);
            failed.push(failure.item_id);
        }
        failed.sort_unstable();
        assert_eq!(failed, vec![2, 4]);
    }

    #[tokio::test]
    async fn closes_output_after_input_exhausted() {
        let (input_tx, input_rx) = stream(1);
        let (output_tx, mut output_rx) = stream(1);
        let (errors_tx, _errors_rx) = error_sink(1);

        let processor = StageProcessor::new(StageId::THIRD, 1, Arc::new(passthrough()));
        let worker = tokio::spawn(processor.run(SharedStreamRx::new(input_rx), output_tx, errors_tx));

        drop(input_tx);
        worker.await.unwrap();

        // No items were fed, so the output must close without yielding.
        assert!(output_rx.recv().await.is_none());
    }
}
