//! Start-gated background worker.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use workgate_core::{Handler, HandlerError, WorkerId};

use crate::config::WorkerConfig;
use crate::gate::{GateOutcome, StartGate};
use crate::outbox::{Delivery, Outbox};
use crate::shutdown::ShutdownGuard;

/// Receiving side of the results stream.
pub type Results<T> = mpsc::Receiver<T>;

/// Receiving side of the errors stream.
pub type Errors = mpsc::Receiver<HandlerError>;

/// A background worker that waits on its start gate and then invokes its
/// handler in a loop until cancelled.
///
/// ```text
/// wait for gate
/// loop {
///   ├─► cancelled?          ─► exit
///   ├─► handler.handle()
///   │       ├─ Ok(v)  ─► deliver v on results
///   │       └─ Err(e) ─► deliver e on errors
///   └─► repeat
/// }
/// close results + errors, release shutdown guard
/// ```
pub struct Worker<H> {
    id: WorkerId,
    handler: H,
    gate: StartGate,
    config: WorkerConfig,
}

impl<H: Handler> Worker<H> {
    /// Bind a handler to a start gate. Nothing runs until [`Worker::run`].
    pub fn new(handler: H, gate: StartGate) -> Self {
        Self {
            id: WorkerId::generate(),
            handler,
            gate,
            config: WorkerConfig::default(),
        }
    }

    /// Builder method to override the configuration.
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// This worker's id, as it appears in log fields.
    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Spawn the worker task and return its output streams.
    ///
    /// Returns immediately, before the gate opens. `guard` must come from the
    /// caller's [`ShutdownCounter`](crate::ShutdownCounter); it is released
    /// after both streams have been closed.
    pub fn run(
        self,
        cancel: CancellationToken,
        guard: ShutdownGuard,
    ) -> (Results<H::Output>, Errors) {
        let delivery = self.config.delivery;
        let (results, results_rx) = Outbox::channel(self.config.results_buffer, delivery);
        let (errors, errors_rx) = Outbox::channel(self.config.errors_buffer, delivery);

        tokio::spawn(self.work(cancel, results, errors, guard));

        (results_rx, errors_rx)
    }

    async fn work(
        mut self,
        cancel: CancellationToken,
        results: Outbox<H::Output>,
        errors: Outbox<HandlerError>,
        guard: ShutdownGuard,
    ) {
        let gate = if self.config.delivery.observes_cancellation() {
            self.gate.wait_or_cancel(&cancel).await
        } else {
            self.gate.wait().await
        };

        let invocations = match gate {
            GateOutcome::Opened => {
                info!(worker_id = %self.id, delivery = %self.config.delivery, "Worker started");
                Self::drive(&self.id, &mut self.handler, &cancel, &results, &errors).await
            }
            GateOutcome::Abandoned => {
                warn!(worker_id = %self.id, "Start trigger dropped before opening the gate");
                0
            }
            GateOutcome::Cancelled => {
                info!(worker_id = %self.id, "Cancelled before the gate opened");
                0
            }
        };

        drop(results);
        drop(errors);
        info!(worker_id = %self.id, invocations, "Worker stopped, streams closed");
        guard.done();
    }

    /// The handler loop. Returns the number of handler invocations.
    async fn drive(
        id: &WorkerId,
        handler: &mut H,
        cancel: &CancellationToken,
        results: &Outbox<H::Output>,
        errors: &Outbox<HandlerError>,
    ) -> u64 {
        let mut invocations = 0u64;

        loop {
            if cancel.is_cancelled() {
                debug!(worker_id = %id, "Cancellation observed");
                break;
            }

            invocations += 1;
            let delivery = match handler.handle().await {
                Ok(value) => {
                    debug!(worker_id = %id, invocation = invocations, "Handler succeeded");
                    results.deliver(value, cancel).await
                }
                Err(error) => {
                    debug!(
                        worker_id = %id,
                        invocation = invocations,
                        error = %error,
                        "Handler failed"
                    );
                    errors.deliver(error, cancel).await
                }
            };

            match delivery {
                Delivery::Accepted => {}
                Delivery::Cancelled => {
                    debug!(
                        worker_id = %id,
                        invocation = invocations,
                        "Pending delivery dropped on cancellation"
                    );
                    break;
                }
                Delivery::Parked => {
                    debug!(
                        worker_id = %id,
                        invocation = invocations,
                        "Cancelled with a value left unread in the stream"
                    );
                    break;
                }
                Delivery::Disconnected => {
                    warn!(worker_id = %id, "Consumer dropped its stream");
                    break;
                }
            }
        }

        invocations
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use workgate_core::{DeliveryPolicy, HandlerFn};

    use super::*;
    use crate::gate::start_gate;
    use crate::shutdown::ShutdownCounter;

    fn counting(calls: Arc<AtomicUsize>) -> impl Handler<Output = usize> {
        HandlerFn::new(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, HandlerError>(n) }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_runs_before_gate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (trigger, gate) = start_gate();
        let counter = ShutdownCounter::new();
        let cancel = CancellationToken::new();

        let (mut results, mut errors) =
            Worker::new(counting(calls.clone()), gate).run(cancel.clone(), counter.add());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(results.try_recv().is_err());
        assert!(errors.try_recv().is_err());

        trigger.open();
        assert_eq!(results.recv().await, Some(1));

        cancel.cancel();
        while results.recv().await.is_some() {}
        counter.wait().await;
    }

    #[tokio::test]
    async fn test_abandoned_gate_closes_streams() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (trigger, gate) = start_gate();
        let counter = ShutdownCounter::new();

        let (mut results, mut errors) =
            Worker::new(counting(calls.clone()), gate).run(CancellationToken::new(), counter.add());
        drop(trigger);

        assert_eq!(results.recv().await, None);
        assert_eq!(errors.recv().await, None);
        counter.wait().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_aware_exits_before_gate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (_trigger, gate) = start_gate();
        let counter = ShutdownCounter::new();
        let cancel = CancellationToken::new();
        let config = WorkerConfig {
            delivery: DeliveryPolicy::CancelAware,
            ..WorkerConfig::default()
        };

        let (mut results, _errors) = Worker::new(counting(calls.clone()), gate)
            .with_config(config)
            .run(cancel.clone(), counter.add());
        cancel.cancel();

        assert_eq!(results.recv().await, None);
        counter.wait().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dropped_consumer_stops_worker() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (trigger, gate) = start_gate();
        let counter = ShutdownCounter::new();

        let (results, errors) =
            Worker::new(counting(calls.clone()), gate).run(CancellationToken::new(), counter.add());
        drop(results);
        drop(errors);
        trigger.open();

        counter.wait().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
