//! Shutdown counter: a wait-group over outstanding worker tasks.

use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;

/// Counts outstanding workers so a supervisor can wait for all of them.
///
/// Registration happens up front with [`ShutdownCounter::add`]; the returned
/// guard is handed to the worker, which releases it once its streams are
/// closed.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCounter {
    tracker: TaskTracker,
}

impl ShutdownCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one outstanding unit of work.
    pub fn add(&self) -> ShutdownGuard {
        ShutdownGuard {
            token: self.tracker.token(),
        }
    }

    /// Number of guards still alive.
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Close the counter and wait until every guard has been released.
    /// Waits forever if a guard is never released.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// One registration on a [`ShutdownCounter`]. Released on drop.
#[derive(Debug)]
pub struct ShutdownGuard {
    token: TaskTrackerToken,
}

impl ShutdownGuard {
    /// Release this registration.
    pub fn done(self) {
        drop(self.token);
    }
}
