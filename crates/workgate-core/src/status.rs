//! Supervisor lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// Lifecycle of a supervisor and the single worker it drives.
///
/// ```text
/// Idle ──► Started ──► Running ──► ShuttingDown ──► Stopped
/// ```
///
/// There is no restart path: `Stopped` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisorState {
    /// Constructed, worker not yet spawned.
    #[default]
    Idle,
    /// Worker spawned and waiting on its start gate.
    Started,
    /// Start gate opened; the worker is invoking its handler.
    Running,
    /// Cancellation issued, waiting for the worker to exit.
    ShuttingDown,
    /// Worker exited and both streams are closed.
    Stopped,
}

impl SupervisorState {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true if `next` is the single legal successor of this state.
    pub fn can_transition_to(&self, next: SupervisorState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Started)
                | (Self::Started, Self::Running)
                | (Self::Running, Self::ShuttingDown)
                | (Self::ShuttingDown, Self::Stopped)
        )
    }

    /// Validate a transition, returning the new state.
    pub fn transition(self, next: SupervisorState) -> Result<SupervisorState, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Stable lowercase name, used in log fields and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Started => "started",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let mut state = SupervisorState::default();
        assert_eq!(state, SupervisorState::Idle);

        for next in [
            SupervisorState::Started,
            SupervisorState::Running,
            SupervisorState::ShuttingDown,
            SupervisorState::Stopped,
        ] {
            state = state.transition(next).unwrap();
        }

        assert!(state.is_terminal());
    }

    #[test]
    fn test_no_skipping_or_restart() {
        assert!(!SupervisorState::Idle.can_transition_to(SupervisorState::Running));
        assert!(!SupervisorState::Running.can_transition_to(SupervisorState::Stopped));
        assert!(!SupervisorState::Stopped.can_transition_to(SupervisorState::Idle));
        assert!(!SupervisorState::Stopped.can_transition_to(SupervisorState::Started));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = SupervisorState::Stopped
            .transition(SupervisorState::Running)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidStateTransition {
                from: "stopped".to_string(),
                to: "running".to_string(),
            }
        );
        assert_eq!(err.to_string(), "Invalid state transition: stopped -> running");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SupervisorState::ShuttingDown).unwrap();
        assert_eq!(json, "\"SHUTTING_DOWN\"");
    }
}
