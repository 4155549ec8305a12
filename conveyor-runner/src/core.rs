use anyhow::Context;
use conveyor::concurrency::signal::create_signal;
use conveyor::concurrency::stream::stream;
use conveyor::conveyor_error;
use conveyor::error::ErrorKind;
use conveyor::pipeline::Pipeline;
use conveyor::replica::StageChain;
use conveyor::sink::{drain_and_log, error_sink};
use conveyor::transform::SimulatedTransform;
use conveyor::types::{ItemId, StageItem};
use conveyor_config::load::load_config;
use conveyor_config::shared::RunnerConfig;
use tracing::{debug, info};

/// Raw record as produced by the input feed.
#[derive(Debug)]
struct RawRecord {
    id: ItemId,
}

/// Record after the decode stage.
#[derive(Debug)]
struct DecodedRecord {
    id: ItemId,
}

/// Record after the enrich stage.
#[derive(Debug)]
struct EnrichedRecord {
    id: ItemId,
}

/// Record as delivered on the merged output.
#[derive(Debug)]
struct FinalRecord {
    id: ItemId,
}

impl StageItem for RawRecord {
    fn id(&self) -> ItemId {
        self.id
    }
}

impl StageItem for DecodedRecord {
    fn id(&self) -> ItemId {
        self.id
    }
}

impl StageItem for EnrichedRecord {
    fn id(&self) -> ItemId {
        self.id
    }
}

impl StageItem for FinalRecord {
    fn id(&self) -> ItemId {
        self.id
    }
}

/// Runs one complete pipeline pass: feed, process, drain, report.
///
/// The error drainer is started before the pipeline so a slow error path can
/// never stall the stages, and the merged output is consumed before the
/// handle is awaited so fan-in forwarders never block on a full channel.
pub async fn start_runner() -> anyhow::Result<()> {
    let config: RunnerConfig = load_config()?;
    config.validate()?;

    info!(
        item_count = config.item_count,
        replica_count = config.pipeline.replica_count,
        failure_rate = config.simulation.failure_rate,
        "starting conveyor runner"
    );

    // The drainer must run for the pipeline's entire lifetime; it terminates
    // on its own once the last stage task drops its sink sender.
    let (errors_tx, errors_rx) = error_sink(config.pipeline.channel_capacity);
    let drainer = tokio::spawn(drain_and_log(errors_rx));

    let chain = StageChain::new(
        SimulatedTransform::new(&config.simulation, |record: &RawRecord| DecodedRecord {
            id: record.id,
        }),
        SimulatedTransform::new(&config.simulation, |record: &DecodedRecord| EnrichedRecord {
            id: record.id,
        }),
        SimulatedTransform::new(&config.simulation, |record: &EnrichedRecord| FinalRecord {
            id: record.id,
        }),
    );

    let (input_tx, input_rx) = stream(config.pipeline.channel_capacity);
    let pipeline = Pipeline::new(config.pipeline.clone(), chain);
    let (mut merged, handle) = pipeline.start(input_rx, errors_tx)?;

    // Ctrl-c does not cancel in-flight items; it only closes the input early,
    // which triggers the normal exhaustion-driven shutdown cascade.
    let (shutdown_tx, mut shutdown_rx) = create_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, closing pipeline input");
            let _ = shutdown_tx.send(());
        }
    });

    let item_count = config.item_count;
    let feeder = tokio::spawn(async move {
        for id in 0..item_count {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!(fed = id, "input feed interrupted");
                    break;
                }
                result = input_tx.send(RawRecord { id }) => {
                    if result.is_err() {
                        break;
                    }
                }
            }
        }
        // Dropping the sender here closes the input stream and starts the
        // shutdown cascade.
    });

    let mut delivered: u64 = 0;
    while let Some(record) = merged.recv().await {
        debug!(item_id = record.id(), "record delivered");
        delivered += 1;
    }

    feeder
        .await
        .map_err(|err| conveyor_error!(ErrorKind::FeederPanic, "Feeder task panicked", err))?;
    handle.wait().await?;
    let failed = drainer.await.context("error drainer panicked")?;

    info!(
        delivered,
        failed,
        total = delivered + failed,
        "pipeline drained"
    );

    Ok(())
}
