//! Worker and supervisor configuration.

use std::time::Duration;

use workgate_core::DeliveryPolicy;

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// How results and errors are handed to the consumer.
    pub delivery: DeliveryPolicy,

    /// Capacity of the results stream. Zero means rendezvous.
    pub results_buffer: usize,

    /// Capacity of the errors stream. Zero means rendezvous.
    pub errors_buffer: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryPolicy::Blocking,
            results_buffer: 1,
            errors_buffer: 0,
        }
    }
}

/// Supervisor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Configuration for the worker the supervisor spawns.
    pub worker: WorkerConfig,

    /// Upper bound on the shutdown wait. `None` waits forever.
    pub shutdown_timeout: Option<Duration>,
}

/// Configuration for the random demonstration handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkConfig {
    /// Simulated latency of each call.
    pub latency: Duration,

    /// Draws at or above this value are reported as failures.
    pub threshold: u32,

    /// RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(250),
            threshold: 50,
            seed: None,
        }
    }
}
