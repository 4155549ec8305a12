use std::collections::HashSet;
use std::time::Duration;

use conveyor::concurrency::stream::{StreamRx, stream};
use conveyor::fanin::fan_in;
use tokio::time::timeout;

#[tokio::test]
async fn merge_output_equals_union_of_sources() {
    let mut sources = Vec::new();
    let mut expected = HashSet::new();

    for source_index in 0..5u64 {
        let (tx, rx) = stream(16);
        for offset in 0..10 {
            let id = source_index * 100 + offset;
            expected.insert(id);
            tx.send(id).await.unwrap();
        }
        drop(tx);
        sources.push(rx);
    }

    let (merged, handle) = fan_in(sources, 1);

    // All sources are already closed, so the merge must finish within a
    // bounded wait even with a capacity-1 output channel.
    let items = timeout(Duration::from_secs(10), merged.drain())
        .await
        .expect("merged stream did not close after all sources closed");

    assert_eq!(items.len(), expected.len(), "an item was dropped or duplicated");
    assert_eq!(items.into_iter().collect::<HashSet<u64>>(), expected);

    handle.wait().await.unwrap();
}

#[tokio::test]
async fn per_source_order_survives_the_merge() {
    let (left_tx, left_rx) = stream(1);
    let (right_tx, right_rx) = stream(1);

    let left_feeder = tokio::spawn(async move {
        for id in 0..100u64 {
            left_tx.send(id).await.unwrap();
        }
    });
    let right_feeder = tokio::spawn(async move {
        for id in 1000..1100u64 {
            right_tx.send(id).await.unwrap();
        }
    });

    let (merged, handle) = fan_in(vec![left_rx, right_rx], 1);
    let items = merged.drain().await;

    left_feeder.await.unwrap();
    right_feeder.await.unwrap();
    handle.wait().await.unwrap();

    let left: Vec<u64> = items.iter().copied().filter(|id| *id < 1000).collect();
    let right: Vec<u64> = items.iter().copied().filter(|id| *id >= 1000).collect();

    assert_eq!(left, (0..100).collect::<Vec<_>>());
    assert_eq!(right, (1000..1100).collect::<Vec<_>>());
}

#[tokio::test]
async fn merge_of_empty_sources_closes_immediately() {
    let mut sources: Vec<StreamRx<u64>> = Vec::new();
    for _ in 0..4 {
        let (tx, rx) = stream::<u64>(1);
        drop(tx);
        sources.push(rx);
    }

    let (merged, handle) = fan_in(sources, 1);
    let items = timeout(Duration::from_secs(5), merged.drain())
        .await
        .expect("merged stream did not close");

    assert!(items.is_empty());
    handle.wait().await.unwrap();
}
