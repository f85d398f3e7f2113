//! Handlers shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use workgate_core::{Handler, HandlerError};

/// Plays back a fixed list of outcomes, then fails with "script exhausted".
pub struct Scripted {
    outcomes: VecDeque<Result<i64, HandlerError>>,
    calls: Arc<AtomicUsize>,
    latency: Duration,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl Scripted {
    pub fn new(outcomes: impl IntoIterator<Item = Result<i64, HandlerError>>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            calls: Arc::new(AtomicUsize::new(0)),
            latency: Duration::ZERO,
            cancel_after: None,
        }
    }

    /// Cancel `token` from inside the `n`th call, before it returns.
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Shared invocation counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Handler for Scripted {
    type Output = i64;

    async fn handle(&mut self) -> Result<i64, HandlerError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some((limit, token)) = &self.cancel_after {
            if n >= *limit {
                token.cancel();
            }
        }
        self.outcomes
            .pop_front()
            .unwrap_or_else(|| Err(HandlerError::new("script exhausted")))
    }
}

/// Fails on every call.
pub fn always_failing() -> Scripted {
    Scripted::new(std::iter::empty())
}

pub fn ok(v: i64) -> Result<i64, HandlerError> {
    Ok(v)
}

pub fn fail(message: &str) -> Result<i64, HandlerError> {
    Err(HandlerError::new(message))
}
