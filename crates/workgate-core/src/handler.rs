//! The repeatable unit of work a worker executes.

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A business failure reported by a [`Handler`].
///
/// Failures are ordinary data: the worker forwards them on its error stream
/// and keeps looping. They are never retried and never stop the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a new handler error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A zero-argument operation producing either a value or a [`HandlerError`].
///
/// The worker owns its handler and calls it sequentially, so implementations
/// may keep mutable state (a seeded RNG, a script of outcomes) without any
/// locking.
#[async_trait]
pub trait Handler: Send + 'static {
    /// Value produced on success. Opaque to the worker.
    type Output: Send + 'static;

    /// Run one unit of work.
    async fn handle(&mut self) -> Result<Self::Output, HandlerError>;
}

/// Adapts a closure returning a future into a [`Handler`].
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut, T> Handler for HandlerFn<F>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    async fn handle(&mut self) -> Result<T, HandlerError> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_display() {
        let err = HandlerError::new("value greater than 50");
        assert_eq!(err.to_string(), "value greater than 50");
        assert_eq!(err.message(), "value greater than 50");
    }

    #[tokio::test]
    async fn test_handler_fn_keeps_state_between_calls() {
        let mut calls = 0u32;
        let mut handler = HandlerFn::new(move || {
            calls += 1;
            let n = calls;
            async move {
                if n % 2 == 0 {
                    Err(HandlerError::new(format!("call {} failed", n)))
                } else {
                    Ok(n)
                }
            }
        });

        assert_eq!(handler.handle().await, Ok(1));
        assert_eq!(
            handler.handle().await,
            Err(HandlerError::new("call 2 failed"))
        );
        assert_eq!(handler.handle().await, Ok(3));
    }
}
