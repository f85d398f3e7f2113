//! workgate worker runtime.
//!
//! A [`Worker`] waits on a one-shot start gate, then calls its handler in a
//! loop and hands every outcome to one of two streams. A [`Supervisor`] opens
//! the gate, reports what arrives, and on interrupt cancels the worker and
//! waits on a [`ShutdownCounter`] for it to exit.
//!
//! Whether a worker parked on a send can be cancelled is governed by
//! [`DeliveryPolicy`](workgate_core::DeliveryPolicy). The default keeps the
//! send blocking, so a supervisor that stops reading before it cancels can
//! wait forever.

pub mod config;
pub mod error;
pub mod gate;
pub mod outbox;
pub mod shutdown;
pub mod sink;
pub mod supervisor;
pub mod work;
pub mod worker;

pub use config::{SupervisorConfig, WorkConfig, WorkerConfig};
pub use error::SupervisorError;
pub use gate::{start_gate, GateOutcome, StartGate, StartTrigger};
pub use outbox::{Delivery, Outbox};
pub use shutdown::{ShutdownCounter, ShutdownGuard};
pub use sink::{ConsoleSink, JsonSink, OutputSink};
pub use supervisor::{StopReason, Supervisor, SupervisorReport};
pub use work::RandomWork;
pub use worker::{Errors, Results, Worker};
