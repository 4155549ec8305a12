//! Out-of-band collection of per-item failures.
//!
//! The error sink is the one resource shared by every stage of every replica.
//! It must have exactly one continuously-running drainer for the pipeline's
//! lifetime, started before any item is fed. The sink closes on its own once
//! the last stage task finishes and drops its sender clone, so the drainer
//! terminates without explicit coordination and can never observe a send on a
//! closed channel.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::warn;

use crate::types::{ItemId, StageFailure, StageId};

/// Sending half of the error sink, cloned into every stage task.
#[derive(Debug, Clone)]
pub struct ErrorSinkTx {
    tx: mpsc::Sender<StageFailure>,
}

impl ErrorSinkTx {
    /// Reports one failure to the sink, blocking until the drainer accepts it.
    ///
    /// If the drainer has gone away the failure is logged and dropped; losing
    /// a diagnostic record must not take the success path down with it.
    pub async fn report(&self, failure: StageFailure) {
        if self.tx.send(failure).await.is_err() {
            warn!("error sink has no drainer, dropping failure record");
        }
    }
}

/// Receiving half of the error sink, owned by the single drainer.
#[derive(Debug)]
pub struct ErrorSinkRx {
    rx: mpsc::Receiver<StageFailure>,
}

impl ErrorSinkRx {
    /// Receives the next failure, or `None` once no stage can produce more.
    pub async fn recv(&mut self) -> Option<StageFailure> {
        self.rx.recv().await
    }
}

/// Creates the error sink shared by all stages of a pipeline.
pub fn error_sink(capacity: usize) -> (ErrorSinkTx, ErrorSinkRx) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ErrorSinkTx { tx }, ErrorSinkRx { rx })
}

/// Reference drain behavior: logs one line per failure.
///
/// Runs until the sink closes and returns the number of failures observed.
pub async fn drain_and_log(mut rx: ErrorSinkRx) -> u64 {
    let mut count = 0;
    while let Some(failure) = rx.recv().await {
        warn!(
            stage = %failure.stage,
            item_id = failure.item_id,
            "{failure}"
        );
        count += 1;
    }
    count
}

/// Drain behavior that accumulates failures into a [`FailureReport`].
pub async fn drain_into_report(mut rx: ErrorSinkRx) -> FailureReport {
    let mut report = FailureReport::default();
    while let Some(failure) = rx.recv().await {
        report.record(failure);
    }
    report
}

/// Summary of every failure observed during one pipeline run.
#[derive(Debug, Default)]
pub struct FailureReport {
    failures: Vec<StageFailure>,
    per_stage: BTreeMap<StageId, u64>,
}

impl FailureReport {
    fn record(&mut self, failure: StageFailure) {
        *self.per_stage.entry(failure.stage).or_default() += 1;
        self.failures.push(failure);
    }

    /// Total number of failed items.
    pub fn total(&self) -> u64 {
        self.failures.len() as u64
    }

    /// Returns true when no failures were observed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failures attributed to the given stage.
    pub fn failures_at(&self, stage: StageId) -> u64 {
        self.per_stage.get(&stage).copied().unwrap_or(0)
    }

    /// Ids of every failed item, in observation order.
    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failures.iter().map(|failure| failure.item_id).collect()
    }

    /// The collected failure records.
    pub fn failures(&self) -> &[StageFailure] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestItem;
    use crate::types::TransformError;

    fn failure(stage: StageId, id: ItemId) -> StageFailure {
        StageFailure::new(stage, TestItem::new(id), TransformError::new("boom"))
    }

    #[tokio::test]
    async fn report_aggregates_failures_per_stage() {
        let (tx, rx) = error_sink(8);

        let drainer = tokio::spawn(drain_into_report(rx));

        tx.report(failure(StageId::FIRST, 1)).await;
        tx.report(failure(StageId::FIRST, 2)).await;
        tx.report(failure(StageId::THIRD, 3)).await;
        drop(tx);

        let report = drainer.await.unwrap();
        assert_eq!(report.total(), 3);
        assert_eq!(report.failures_at(StageId::FIRST), 2);
        assert_eq!(report.failures_at(StageId::SECOND), 0);
        assert_eq!(report.failures_at(StageId::THIRD), 1);
        assert_eq!(report.failed_ids(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn sink_closes_once_all_senders_drop() {
        let (tx, mut rx) = error_sink(1);
        let second = tx.clone();

        drop(tx);
        drop(second);

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn reporting_without_drainer_does_not_panic() {
        let (tx, rx) = error_sink(1);
        drop(rx);

        tx.report(failure(StageId::SECOND, 9)).await;
    }
}
