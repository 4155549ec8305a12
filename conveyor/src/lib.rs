pub mod concurrency;
pub mod error;
pub mod fanin;
pub mod macros;
pub mod pipeline;
pub mod pool;
pub mod replica;
pub mod sink;
pub mod stage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transform;
pub mod types;
