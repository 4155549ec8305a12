//! Bounded stream primitives connecting pipeline tasks.
//!
//! Streams are small bounded mpsc channels: a capacity of 1 approximates the
//! direct hand-off the topology is designed around, so a producer suspends
//! until a consumer is ready rather than buffering unboundedly.

use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Arc;

use futures::Stream;
use tokio::sync::{Mutex, mpsc};

/// Sending half of a pipeline stream.
pub type StreamTx<T> = mpsc::Sender<T>;

/// Receiving half of a pipeline stream, owned by a single consumer.
pub type StreamRx<T> = mpsc::Receiver<T>;

/// Creates a bounded pipeline stream.
///
/// The stream closes when every sender clone has been dropped; receivers
/// observe closure as `None` after the in-flight items are drained.
pub fn stream<T>(capacity: usize) -> (StreamTx<T>, StreamRx<T>) {
    mpsc::channel(capacity.max(1))
}

/// Receiving half of a stream shared by multiple competing consumers.
///
/// Cloning hands out another competitor: each item is delivered to exactly one
/// caller of [`SharedStreamRx::recv`], which is what distributes a single
/// input stream across pipeline replicas without broadcasting.
#[derive(Debug)]
pub struct SharedStreamRx<T> {
    inner: Arc<Mutex<StreamRx<T>>>,
}

impl<T> Clone for SharedStreamRx<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedStreamRx<T> {
    /// Wraps a receiver for competitive consumption.
    pub fn new(rx: StreamRx<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rx)),
        }
    }

    /// Receives the next item, or `None` once the stream is closed and drained.
    ///
    /// The underlying lock is fair, so waiting competitors take turns instead
    /// of one consumer starving the rest.
    pub async fn recv(&self) -> Option<T> {
        self.inner.lock().await.recv().await
    }
}

impl<T> From<StreamRx<T>> for SharedStreamRx<T> {
    fn from(rx: StreamRx<T>) -> Self {
        Self::new(rx)
    }
}

/// Single output stream produced by merging multiple source streams.
///
/// Closes once every source stream has been drained and closed. Implements
/// [`futures::Stream`] so consumers can use combinators, and exposes
/// [`MergedStream::recv`] for plain loop-based consumption.
#[derive(Debug)]
pub struct MergedStream<T> {
    rx: StreamRx<T>,
}

impl<T> MergedStream<T> {
    pub(crate) fn new(rx: StreamRx<T>) -> Self {
        Self { rx }
    }

    /// Receives the next merged item, or `None` once all sources are exhausted.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Consumes the stream, collecting every remaining item in arrival order.
    pub async fn drain(mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item);
        }
        items
    }
}

impl<T> Stream for MergedStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
