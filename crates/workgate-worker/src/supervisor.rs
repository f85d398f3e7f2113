//! Supervisor control loop.
//!
//! The supervisor owns one [`Worker`], opens its start gate, and multiplexes
//! three event sources until told to stop:
//!
//! ```text
//!        interrupt ─┐
//! shutdown_handle ──┼──► select ──► break ──► cancel ──► wait(counter) ──► Stopped
//!  results/errors ──┘    │
//!                        └──► sink.on_result / sink.on_error, continue
//! ```
//!
//! The receivers stay alive (undrained) until the shutdown wait finishes. With
//! [`DeliveryPolicy::Blocking`](workgate_core::DeliveryPolicy::Blocking) a
//! worker that is parked on a send at that point never exits, and the wait
//! never returns unless [`SupervisorConfig::shutdown_timeout`] is set.

use std::future::Future;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use workgate_core::{Handler, SupervisorState};

use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::gate::{start_gate, StartTrigger};
use crate::shutdown::ShutdownCounter;
use crate::sink::OutputSink;
use crate::worker::Worker;

/// Why the multiplex loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The external interrupt fired.
    Interrupted,
    /// Someone cancelled the shutdown handle.
    Requested,
    /// The worker closed both streams on its own.
    WorkerExited,
}

/// Summary of a completed supervisor run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorReport {
    /// Values received on the results stream.
    pub results: u64,
    /// Failures received on the errors stream.
    pub errors: u64,
    /// Why the loop ended.
    pub reason: StopReason,
}

/// Drives a single worker from start to orderly shutdown.
pub struct Supervisor<H> {
    worker: Worker<H>,
    trigger: StartTrigger,
    config: SupervisorConfig,
    shutdown: CancellationToken,
    state: watch::Sender<SupervisorState>,
}

impl<H: Handler> Supervisor<H> {
    /// Create a supervisor with the default configuration.
    pub fn new(handler: H) -> Self {
        Self::with_config(handler, SupervisorConfig::default())
    }

    /// Create a supervisor with an explicit configuration.
    pub fn with_config(handler: H, config: SupervisorConfig) -> Self {
        let (trigger, gate) = start_gate();
        let worker = Worker::new(handler, gate).with_config(config.worker.clone());
        let (state, _) = watch::channel(SupervisorState::Idle);

        Self {
            worker,
            trigger,
            config,
            shutdown: CancellationToken::new(),
            state,
        }
    }

    /// Token that requests shutdown when cancelled.
    ///
    /// This is the same token the worker observes, so an interrupt and an
    /// explicit request go down the same shutdown path.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Run the worker until `interrupt` resolves, the shutdown handle is
    /// cancelled, or the worker exits, then shut down.
    pub async fn run<F, S>(
        self,
        interrupt: F,
        sink: &mut S,
    ) -> Result<SupervisorReport, SupervisorError>
    where
        F: Future<Output = ()>,
        S: OutputSink<H::Output>,
    {
        let Self {
            worker,
            trigger,
            config,
            shutdown,
            state,
        } = self;
        let worker_id = worker.id().clone();

        let counter = ShutdownCounter::new();
        let guard = counter.add();
        let (mut results, mut errors) = worker.run(shutdown.clone(), guard);
        advance(&state, SupervisorState::Started)?;

        if !trigger.open() {
            warn!(worker_id = %worker_id, "Worker gone before the start gate opened");
        }
        advance(&state, SupervisorState::Running)?;

        tokio::pin!(interrupt);
        let mut report_results = 0u64;
        let mut report_errors = 0u64;
        let mut results_open = true;
        let mut errors_open = true;

        let reason = loop {
            if !results_open && !errors_open {
                break StopReason::WorkerExited;
            }

            tokio::select! {
                _ = &mut interrupt => break StopReason::Interrupted,
                _ = shutdown.cancelled() => break StopReason::Requested,
                result = results.recv(), if results_open => match result {
                    Some(value) => {
                        report_results += 1;
                        sink.on_result(&value);
                    }
                    None => results_open = false,
                },
                error = errors.recv(), if errors_open => match error {
                    Some(error) => {
                        report_errors += 1;
                        sink.on_error(&error);
                    }
                    None => errors_open = false,
                },
            }
        };

        info!(worker_id = %worker_id, reason = ?reason, "Shutting down");
        advance(&state, SupervisorState::ShuttingDown)?;
        shutdown.cancel();

        match config.shutdown_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, counter.wait()).await.is_err() {
                    warn!(
                        worker_id = %worker_id,
                        timeout = ?limit,
                        "Worker did not exit; a send is still pending"
                    );
                    return Err(SupervisorError::ShutdownTimedOut(limit));
                }
            }
            None => counter.wait().await,
        }

        // Receivers outlive the wait; dropping them earlier would unblock the worker.
        drop(results);
        drop(errors);
        advance(&state, SupervisorState::Stopped)?;

        let report = SupervisorReport {
            results: report_results,
            errors: report_errors,
            reason,
        };
        info!(
            worker_id = %worker_id,
            results = report.results,
            errors = report.errors,
            "Shutdown complete"
        );
        sink.on_stopped(&report);

        Ok(report)
    }
}

fn advance(
    state: &watch::Sender<SupervisorState>,
    next: SupervisorState,
) -> Result<(), SupervisorError> {
    let from = *state.borrow();
    let to = from.transition(next)?;
    state.send_replace(to);
    info!(from = %from, to = %to, "Supervisor state changed");
    Ok(())
}
