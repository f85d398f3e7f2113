//! Sending side of a worker output stream.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use workgate_core::DeliveryPolicy;

/// Result of handing one value to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The consumer accepted the value.
    Accepted,
    /// Cancellation fired before the value entered the stream; it is dropped.
    Cancelled,
    /// Cancellation fired after the value entered the rendezvous slot but
    /// before the consumer took it. The value stays readable.
    Parked,
    /// The consumer dropped its receiver.
    Disconnected,
}

/// One output stream of a worker.
///
/// A buffer of zero is a rendezvous: the value sits in a single slot and the
/// send only completes once the consumer has taken it back out, which is how
/// an unbuffered channel behaves.
#[derive(Debug)]
pub struct Outbox<T> {
    tx: mpsc::Sender<T>,
    rendezvous: bool,
    policy: DeliveryPolicy,
}

impl<T: Send> Outbox<T> {
    /// Create an outbox and the receiver its consumer reads from.
    pub fn channel(buffer: usize, policy: DeliveryPolicy) -> (Self, mpsc::Receiver<T>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let outbox = Self {
            tx,
            rendezvous: buffer == 0,
            policy,
        };
        (outbox, rx)
    }

    /// Hand `value` to the consumer according to the delivery policy.
    pub async fn deliver(&self, value: T, cancel: &CancellationToken) -> Delivery {
        match self.policy {
            DeliveryPolicy::Blocking => {
                if self.tx.send(value).await.is_err() {
                    return Delivery::Disconnected;
                }
                if self.rendezvous {
                    return self.handoff().await;
                }
                Delivery::Accepted
            }
            DeliveryPolicy::CancelAware => {
                tokio::select! {
                    biased;
                    sent = self.tx.send(value) => {
                        if sent.is_err() {
                            return Delivery::Disconnected;
                        }
                    }
                    _ = cancel.cancelled() => return Delivery::Cancelled,
                }
                if !self.rendezvous {
                    return Delivery::Accepted;
                }
                tokio::select! {
                    biased;
                    taken = self.handoff() => taken,
                    _ = cancel.cancelled() => Delivery::Parked,
                }
            }
        }
    }

    /// Wait until the slot is free again, i.e. the consumer took the value.
    async fn handoff(&self) -> Delivery {
        match self.tx.reserve().await {
            Ok(_permit) => Delivery::Accepted,
            Err(_) => Delivery::Disconnected,
        }
    }
}
