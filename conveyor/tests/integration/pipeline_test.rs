use std::collections::HashSet;
use std::time::Duration;

use conveyor::concurrency::stream::stream;
use conveyor::pipeline::Pipeline;
use conveyor::replica::StageChain;
use conveyor::sink::{drain_into_report, error_sink};
use conveyor::test_utils::{TestItem, fail_ids, feed_items, identity_chain, passthrough};
use conveyor::transform::SimulatedTransform;
use conveyor::types::{StageId, StageItem};
use conveyor_config::shared::{PipelineConfig, SimulationConfig};
use tokio::time::timeout;

fn pipeline_config(replica_count: u16) -> PipelineConfig {
    PipelineConfig {
        replica_count,
        channel_capacity: 1,
    }
}

fn simulation(failure_rate: f64) -> SimulationConfig {
    SimulationConfig {
        failure_rate,
        ..SimulationConfig::reliable()
    }
}

fn simulated_chain(
    failure_rate: f64,
) -> StageChain<
    impl conveyor::transform::Transform<TestItem, TestItem>,
    impl conveyor::transform::Transform<TestItem, TestItem>,
    impl conveyor::transform::Transform<TestItem, TestItem>,
> {
    let config = simulation(failure_rate);
    StageChain::new(
        SimulatedTransform::new(&config, |item: &TestItem| TestItem::new(item.id())),
        SimulatedTransform::new(&config, |item: &TestItem| TestItem::new(item.id())),
        SimulatedTransform::new(&config, |item: &TestItem| TestItem::new(item.id())),
    )
}

#[tokio::test]
async fn zero_failure_rate_delivers_the_full_id_set() {
    let (errors_tx, errors_rx) = error_sink(16);
    let drainer = tokio::spawn(drain_into_report(errors_rx));

    let (input_tx, input_rx) = stream(1);
    let pipeline = Pipeline::new(pipeline_config(1), simulated_chain(0.0));
    let (merged, handle) = pipeline.start(input_rx, errors_tx).unwrap();

    let feeder = tokio::spawn(feed_items(input_tx, 0..10));

    let outputs: Vec<TestItem> = merged.drain().await;
    feeder.await.unwrap();
    handle.wait().await.unwrap();

    let ids: HashSet<u64> = outputs.iter().map(|item| item.id()).collect();
    assert_eq!(ids, (0..10).collect::<HashSet<u64>>());
    assert!(drainer.await.unwrap().is_empty());
}

#[tokio::test]
async fn full_failure_rate_reports_one_error_per_item() {
    let (errors_tx, errors_rx) = error_sink(16);
    let drainer = tokio::spawn(drain_into_report(errors_rx));

    let (input_tx, input_rx) = stream(1);
    let pipeline = Pipeline::new(pipeline_config(1), simulated_chain(1.0));
    let (merged, handle) = pipeline.start(input_rx, errors_tx).unwrap();

    let feeder = tokio::spawn(feed_items(input_tx, 0..5));

    let outputs: Vec<TestItem> = merged.drain().await;
    feeder.await.unwrap();
    handle.wait().await.unwrap();

    assert!(outputs.is_empty());

    let report = drainer.await.unwrap();
    assert_eq!(report.total(), 5);
    // Every item dies at the first stage it touches.
    assert_eq!(report.failures_at(StageId::FIRST), 5);

    let failed: HashSet<u64> = report.failed_ids().into_iter().collect();
    assert_eq!(failed, (0..5).collect::<HashSet<u64>>());
}

#[tokio::test]
async fn failures_are_attributed_to_the_stage_that_rejected_the_item() {
    let (errors_tx, errors_rx) = error_sink(16);
    let drainer = tokio::spawn(drain_into_report(errors_rx));

    // Items 0 and 1 die at stage 1, 2 and 3 at stage 2, 4 at stage 3.
    let chain = StageChain::new(fail_ids([0, 1]), fail_ids([2, 3]), fail_ids([4]));

    let (input_tx, input_rx) = stream(1);
    let pipeline = Pipeline::new(pipeline_config(1), chain);
    let (merged, handle) = pipeline.start(input_rx, errors_tx).unwrap();

    let feeder = tokio::spawn(feed_items(input_tx, 0..8));

    let outputs: Vec<TestItem> = merged.drain().await;
    feeder.await.unwrap();
    handle.wait().await.unwrap();

    let survivors: HashSet<u64> = outputs.iter().map(|item| item.id()).collect();
    assert_eq!(survivors, HashSet::from([5, 6, 7]));

    let report = drainer.await.unwrap();
    assert_eq!(report.total(), 5);
    assert_eq!(report.failures_at(StageId::FIRST), 2);
    assert_eq!(report.failures_at(StageId::SECOND), 2);
    assert_eq!(report.failures_at(StageId::THIRD), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn many_replicas_lose_and_duplicate_nothing() {
    const ITEM_COUNT: u64 = 10_000;

    let (errors_tx, errors_rx) = error_sink(64);
    let drainer = tokio::spawn(drain_into_report(errors_rx));

    let (input_tx, input_rx) = stream(1);
    let pipeline = Pipeline::new(pipeline_config(10), identity_chain());
    let (merged, handle) = pipeline.start(input_rx, errors_tx).unwrap();

    let feeder = tokio::spawn(feed_items(input_tx, 0..ITEM_COUNT));

    let outputs: Vec<TestItem> = timeout(Duration::from_secs(60), merged.drain())
        .await
        .expect("pipeline did not drain in time");

    feeder.await.unwrap();
    handle.wait().await.unwrap();

    assert_eq!(outputs.len() as u64, ITEM_COUNT, "item lost or duplicated");

    let ids: HashSet<u64> = outputs.iter().map(|item| item.id()).collect();
    assert_eq!(ids.len() as u64, ITEM_COUNT, "duplicate id observed");
    assert_eq!(ids, (0..ITEM_COUNT).collect::<HashSet<u64>>());
    assert!(drainer.await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn conservation_holds_under_random_failures() {
    const ITEM_COUNT: u64 = 2_000;

    let (errors_tx, errors_rx) = error_sink(64);
    let drainer = tokio::spawn(drain_into_report(errors_rx));

    let (input_tx, input_rx) = stream(1);
    let pipeline = Pipeline::new(pipeline_config(10), simulated_chain(0.2));
    let (merged, handle) = pipeline.start(input_rx, errors_tx).unwrap();

    let feeder = tokio::spawn(feed_items(input_tx, 0..ITEM_COUNT));

    let outputs: Vec<TestItem> = timeout(Duration::from_secs(60), merged.drain())
        .await
        .expect("pipeline did not drain in time");

    feeder.await.unwrap();
    handle.wait().await.unwrap();

    let report = drainer.await.unwrap();

    // Every item fed must surface exactly once, as an output or as a failure.
    assert_eq!(outputs.len() as u64 + report.total(), ITEM_COUNT);

    let output_ids: HashSet<u64> = outputs.iter().map(|item| item.id()).collect();
    let failed_ids: HashSet<u64> = report.failed_ids().into_iter().collect();

    assert_eq!(output_ids.len(), outputs.len(), "duplicate output id");
    assert_eq!(failed_ids.len() as u64, report.total(), "duplicate failure id");
    assert!(output_ids.is_disjoint(&failed_ids));

    let mut all = output_ids;
    all.extend(failed_ids);
    assert_eq!(all, (0..ITEM_COUNT).collect::<HashSet<u64>>());
}

#[tokio::test]
async fn surviving_items_keep_their_identity_end_to_end() {
    let (errors_tx, errors_rx) = error_sink(16);
    let drainer = tokio::spawn(drain_into_report(errors_rx));

    let (input_tx, input_rx) = stream(1);
    let chain = StageChain::new(passthrough(), fail_ids([7]), passthrough());
    let pipeline = Pipeline::new(pipeline_config(3), chain);
    let (merged, handle) = pipeline.start(input_rx, errors_tx).unwrap();

    let feeder = tokio::spawn(feed_items(input_tx, 0..20));

    let outputs: Vec<TestItem> = merged.drain().await;
    feeder.await.unwrap();
    handle.wait().await.unwrap();

    let mut ids: Vec<u64> = outputs.iter().map(|item| item.id()).collect();
    ids.sort_unstable();

    let expected: Vec<u64> = (0..20).filter(|id| *id != 7).collect();
    assert_eq!(ids, expected);
    assert_eq!(drainer.await.unwrap().failed_ids(), vec![7]);
}
