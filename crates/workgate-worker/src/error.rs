//! Supervisor errors.

use std::time::Duration;

use thiserror::Error;
use workgate_core::CoreError;

/// Errors returned by [`Supervisor::run`](crate::Supervisor::run).
///
/// Handler failures never show up here; they travel on the error stream.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The worker did not exit within the configured shutdown timeout.
    #[error("Worker did not shut down within {0:?}")]
    ShutdownTimedOut(Duration),

    /// Lifecycle bookkeeping went out of order.
    #[error(transparent)]
    State(#[from] CoreError),
}
