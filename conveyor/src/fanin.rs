//! Merging of multiple output streams into one.

use tokio::task::JoinSet;
use tracing::{Instrument, debug, debug_span, error};

use crate::concurrency::stream::{MergedStream, StreamRx, stream};
use crate::conveyor_error;
use crate::error::{ConveyorResult, ErrorKind};

/// Owns the forwarding tasks behind a [`MergedStream`].
///
/// Dropping the handle aborts the forwarders mid-merge; keep it alive and call
/// [`wait`](FanInHandle::wait) after the merged output has been drained.
#[derive(Debug)]
pub struct FanInHandle {
    forwarders: JoinSet<()>,
}

impl FanInHandle {
    /// Waits for every forwarding task to complete, surfacing panics.
    pub async fn wait(mut self) -> ConveyorResult<()> {
        let mut errors = Vec::new();

        while let Some(result) = self.forwarders.join_next().await {
            if let Err(join_err) = result {
                if join_err.is_cancelled() {
                    debug!("fan-in forwarder task was cancelled");
                } else {
                    errors.push(conveyor_error!(
                        ErrorKind::FanInWorkerPanic,
                        "Fan-in forwarder panicked",
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

/// Merges the given source streams into a single output stream.
///
/// One forwarding task is spawned per source, each holding a clone of the
/// shared output sender. A forwarder pulls from its source until that source
/// is closed and drained, then drops its sender clone; the merged stream
/// closes exactly when the last clone is dropped, which is the
/// counted-completion barrier gating closure on all sources finishing.
///
/// No item is dropped or duplicated, and relative order within a single
/// source is preserved. Interleaving across sources is scheduler-dependent
/// and deliberately unspecified. The forwarders block whenever the merged
/// output has no ready consumer, so the caller must be draining it before
/// the sources finish, or tolerate the stall.
pub fn fan_in<T: Send + 'static>(
    sources: Vec<StreamRx<T>>,
    capacity: usize,
) -> (MergedStream<T>, FanInHandle) {
    let (merged_tx, merged_rx) = stream(capacity);
    let mut forwarders = JoinSet::new();

    for (source_index, mut source) in sources.into_iter().enumerate() {
        let merged_tx = merged_tx.clone();
        forwarders.spawn(
            async move {
                while let Some(item) = source.recv().await {
                    if merged_tx.send(item).await.is_err() {
                        error!("merged output closed with sources still open, stopping forwarder");
                        return;
                    }
                }
            }
            .instrument(debug_span!("fan_in_forwarder", source = source_index)),
        );
    }

    // The forwarders now hold the only senders; once they all finish, the
    // merged stream closes on its own.
    drop(merged_tx);

    (MergedStream::new(merged_rx), FanInHandle { forwarders })
}
