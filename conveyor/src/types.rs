//! Core data types flowing through a conveyor pipeline.

use std::fmt;

use thiserror::Error;

/// Stable identifier carried by every item across all pipeline stages.
pub type ItemId = u64;

/// Unit of work accepted by a pipeline stage.
///
/// Payload shape changes from stage to stage, but the identity returned by
/// [`StageItem::id`] must be preserved by every transform so that outputs and
/// failures can be correlated back to the original input.
pub trait StageItem: Send + Sync + fmt::Debug + 'static {
    /// Returns the stable identity of this item.
    fn id(&self) -> ItemId;
}

/// Ordinal position of a stage within the chain, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(u16);

impl StageId {
    /// The first stage of the chain.
    pub const FIRST: StageId = StageId(1);
    /// The second stage of the chain.
    pub const SECOND: StageId = StageId(2);
    /// The third stage of the chain.
    pub const THIRD: StageId = StageId(3);

    /// Creates a stage id from its 1-based ordinal.
    pub const fn new(ordinal: u16) -> Self {
        StageId(ordinal)
    }

    /// Returns the 1-based ordinal of this stage.
    pub const fn ordinal(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}", self.0)
    }
}

/// Identifier of a pipeline replica within the pool.
pub type ReplicaId = u16;

/// Failure cause produced by a transform for a single item.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    /// Creates a new transform error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Record of a single item failing transformation at a specific stage.
///
/// The record carries the item *as consumed by the failing stage*, rendered
/// through its `Debug` representation, plus the stable item id for lineage
/// correlation. Upstream payload versions are not retained.
#[derive(Debug)]
pub struct StageFailure {
    /// Stage at which the item failed.
    pub stage: StageId,
    /// Stable identity of the failed item.
    pub item_id: ItemId,
    /// The item as consumed by the failing stage, pre-transformation.
    pub payload: String,
    /// Underlying failure cause reported by the transform.
    pub cause: TransformError,
}

impl StageFailure {
    /// Builds a failure record by consuming the item the stage was processing.
    pub fn new<T: StageItem>(stage: StageId, item: T, cause: TransformError) -> Self {
        Self {
            stage,
            item_id: item.id(),
            payload: format!("{item:?}"),
            cause,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processing failed at {} for item {}: {} (payload: {})",
            self.stage, self.item_id, self.cause, self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Record {
        id: ItemId,
    }

    impl StageItem for Record {
        fn id(&self) -> ItemId {
            self.id
        }
    }

    #[test]
    fn failure_captures_item_identity_and_payload() {
        let failure = StageFailure::new(
            StageId::SECOND,
            Record { id: 42 },
            TransformError::new("broken"),
        );

        assert_eq!(failure.stage, StageId::SECOND);
        assert_eq!(failure.item_id, 42);
        assert!(failure.payload.contains("42"));

        let rendered = failure.to_string();
        assert!(rendered.contains("stage 2"));
        assert!(rendered.contains("item 42"));
        assert!(rendered.contains("broken"));
    }

    #[test]
    fn stage_ids_are_ordered_by_ordinal() {
        assert!(StageId::FIRST < StageId::SECOND);
        assert!(StageId::SECOND < StageId::THIRD);
        assert_eq!(StageId::new(3), StageId::THIRD);
    }
}
