//! Simple signaling primitives for task coordination.
//!
//! Abstracts tokio's watch channels into signal types focused on coordination
//! events rather than data transfer. The pipeline core does not consume these;
//! they exist for collaborators at the edges, such as a feeder that stops
//! producing input when an external signal arrives.

use tokio::sync::watch;

/// Transmitter side of a coordination signal channel.
///
/// The signal carries no data payload. It purely notifies receivers that some
/// event has occurred.
pub type SignalTx = watch::Sender<()>;

/// Receiver side of a coordination signal channel.
///
/// Await [`watch::Receiver::changed`] to detect the signal without polling.
pub type SignalRx = watch::Receiver<()>;

/// Creates a new coordination signal channel.
///
/// All receivers observe the same signal, unlike mpsc channels where each
/// message is consumed by a single receiver.
pub fn create_signal() -> (SignalTx, SignalRx) {
    watch::channel(())
}
