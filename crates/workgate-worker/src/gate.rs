//! One-shot start gate.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Create a connected trigger/gate pair.
pub fn start_gate() -> (StartTrigger, StartGate) {
    let (tx, rx) = oneshot::channel();
    (StartTrigger { tx }, StartGate { rx })
}

/// The opening side of a start gate. Consumed by [`StartTrigger::open`], so
/// a gate can be opened at most once.
#[derive(Debug)]
pub struct StartTrigger {
    tx: oneshot::Sender<()>,
}

impl StartTrigger {
    /// Open the gate. Returns false if the waiting side is already gone.
    pub fn open(self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// How a wait on a [`StartGate`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The trigger opened the gate.
    Opened,
    /// The trigger was dropped without opening.
    Abandoned,
    /// Cancellation fired before the gate opened.
    Cancelled,
}

/// The waiting side of a start gate.
#[derive(Debug)]
pub struct StartGate {
    rx: oneshot::Receiver<()>,
}

impl StartGate {
    /// Wait for the gate, ignoring cancellation.
    pub async fn wait(self) -> GateOutcome {
        match self.rx.await {
            Ok(()) => GateOutcome::Opened,
            Err(_) => GateOutcome::Abandoned,
        }
    }

    /// Wait for the gate or for cancellation, whichever comes first.
    ///
    /// An already-opened gate wins over an already-cancelled token.
    pub async fn wait_or_cancel(self, cancel: &CancellationToken) -> GateOutcome {
        tokio::select! {
            biased;
            outcome = self.wait() => outcome,
            _ = cancel.cancelled() => GateOutcome::Cancelled,
        }
    }
}
