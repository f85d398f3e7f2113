//! workgate Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Async runtimes
//! - Channels or signals
//! - Output formats
//!
//! All types here describe the unit of work a worker runs and the lifecycle
//! the supervisor walks through while driving it.

pub mod error;
pub mod handler;
pub mod ids;
pub mod policy;
pub mod status;

// Re-export commonly used types
pub use error::CoreError;
pub use handler::{Handler, HandlerError, HandlerFn};
pub use ids::WorkerId;
pub use policy::DeliveryPolicy;
pub use status::SupervisorState;
