//! Delivery policy for worker output streams.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// How a worker hands a handler outcome to its consumer.
///
/// The cancellation check at the top of the worker loop does not cover the
/// send that follows the handler call. `Blocking` keeps that window open: a
/// worker parked on a full (or rendezvous) stream will never notice
/// cancellation, and a supervisor waiting for it to exit hangs. `CancelAware`
/// waits on "accepted" and "cancelled" together and gives up the send when
/// cancellation wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Wait until the consumer accepts the value, ignoring cancellation.
    #[default]
    Blocking,
    /// Wait until the consumer accepts the value or cancellation fires.
    CancelAware,
}

impl DeliveryPolicy {
    /// Stable name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::CancelAware => "cancel_aware",
        }
    }

    /// Returns true if a pending send gives way to cancellation.
    pub fn observes_cancellation(&self) -> bool {
        matches!(self, Self::CancelAware)
    }
}

impl fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocking" => Ok(Self::Blocking),
            "cancel_aware" | "cancel-aware" => Ok(Self::CancelAware),
            other => Err(CoreError::InvalidInput(format!(
                "unknown delivery policy '{}' (expected 'blocking' or 'cancel-aware')",
                other
            ))),
        }
    }
}
