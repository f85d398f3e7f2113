//! Demonstration handler: slow, randomly failing work.

use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use workgate_core::{Handler, HandlerError};

use crate::config::WorkConfig;

/// Sleeps, then draws a value in `0..100`. Draws at or above the threshold
/// are reported as failures.
pub struct RandomWork {
    rng: StdRng,
    latency: Duration,
    threshold: u32,
}

impl RandomWork {
    /// Build from an explicit RNG.
    pub fn new(rng: StdRng) -> Self {
        let defaults = WorkConfig::default();
        Self {
            rng,
            latency: defaults.latency,
            threshold: defaults.threshold,
        }
    }

    /// Deterministic work from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Work seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Build from configuration, seeding from entropy when no seed is set.
    pub fn from_config(config: &WorkConfig) -> Self {
        let work = match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        };
        work.with_latency(config.latency).with_threshold(config.threshold)
    }

    /// Builder method to set the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Builder method to set the failure threshold.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl Handler for RandomWork {
    type Output = u32;

    async fn handle(&mut self) -> Result<u32, HandlerError> {
        tokio::time::sleep(self.latency).await;

        let value = self.rng.gen_range(0..100);
        if value >= self.threshold {
            return Err(HandlerError::new(format!(
                "value greater than {}",
                self.threshold
            )));
        }

        Ok(value)
    }
}
