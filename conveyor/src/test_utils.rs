//! Deterministic collaborators for exercising the pipeline in tests.

use std::collections::HashSet;

use crate::concurrency::stream::StreamTx;
use crate::replica::StageChain;
use crate::transform::Transform;
use crate::types::{ItemId, StageItem, TransformError};

/// Minimal item used by tests: identity only, no payload data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestItem {
    id: ItemId,
}

impl TestItem {
    /// Creates a test item with the given id.
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }
}

impl StageItem for TestItem {
    fn id(&self) -> ItemId {
        self.id
    }
}

/// Transform that forwards every item unchanged.
#[derive(Debug, Clone)]
pub struct PassThrough;

/// Returns a transform that never fails and preserves the item as-is.
pub fn passthrough() -> PassThrough {
    PassThrough
}

impl Transform<TestItem, TestItem> for PassThrough {
    async fn apply(&self, input: &TestItem) -> Result<TestItem, TransformError> {
        Ok(input.clone())
    }
}

/// Transform that fails every item it sees.
#[derive(Debug, Clone)]
pub struct AlwaysFail;

/// Returns a transform that rejects every item.
pub fn always_fail() -> AlwaysFail {
    AlwaysFail
}

impl Transform<TestItem, TestItem> for AlwaysFail {
    async fn apply(&self, input: &TestItem) -> Result<TestItem, TransformError> {
        Err(TransformError::new(format!(
            "injected failure for item {}",
            input.id()
        )))
    }
}

/// Transform that fails a chosen set of item ids and forwards the rest.
#[derive(Debug, Clone)]
pub struct FailIds {
    ids: HashSet<ItemId>,
}

/// Returns a transform failing exactly the given ids.
pub fn fail_ids(ids: impl IntoIterator<Item = ItemId>) -> FailIds {
    FailIds {
        ids: ids.into_iter().collect(),
    }
}

impl Transform<TestItem, TestItem> for FailIds {
    async fn apply(&self, input: &TestItem) -> Result<TestItem, TransformError> {
        if self.ids.contains(&input.id()) {
            return Err(TransformError::new(format!(
                "injected failure for item {}",
                input.id()
            )));
        }

        Ok(input.clone())
    }
}

/// A three-stage chain that forwards every item unchanged.
pub fn identity_chain() -> StageChain<PassThrough, PassThrough, PassThrough> {
    StageChain::new(passthrough(), passthrough(), passthrough())
}

/// Feeds the given ids into the pipeline input, then closes it by dropping
/// the sender.
pub async fn feed_items(tx: StreamTx<TestItem>, ids: impl IntoIterator<Item = ItemId>) {
    for id in ids {
        tx.send(TestItem::new(id))
            .await
            .expect("pipeline input closed prematurely");
    }
}
