//! Work unit statuses and the transition state machine.

use serde::{Deserialize, Serialize};

/// Observed status of a single work unit.
///
/// A unit reaches one of the three terminal statuses exactly once and
/// never leaves it; a chain whose units are all terminal is inert and may
/// be replaced under its unique name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Registered with the runtime, not yet started.
    Enqueued,
    /// Currently executing on the chain task.
    Running,
    /// Finished successfully; the output bag is final.
    Succeeded,
    /// The unit failed, or a preceding unit's failure aborted it.
    Failed,
    /// Explicitly cancelled, or evicted by a replacing chain.
    Cancelled,
}

impl WorkStatus {
    /// True exactly for the terminal statuses.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Enqueued => "enqueued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Valid status transitions for a work unit.
///
/// The runtime validates every status write against this machine, so a
/// unit can never leave a terminal status or skip the running stage on
/// the way to success. `Enqueued -> Failed` covers dependents aborted by
/// an earlier unit's failure; `Enqueued -> Cancelled` covers eviction and
/// explicit cancellation before dispatch.
pub mod state_machine {
    use super::WorkStatus;

    /// Returns the set of statuses reachable from `from`.
    ///
    /// Terminal statuses return an empty slice because no further
    /// transitions are allowed.
    pub fn valid_transitions(from: WorkStatus) -> &'static [WorkStatus] {
        match from {
            WorkStatus::Enqueued => &[
                WorkStatus::Running,
                WorkStatus::Failed,
                WorkStatus::Cancelled,
            ],
            WorkStatus::Running => &[
                WorkStatus::Succeeded,
                WorkStatus::Failed,
                WorkStatus::Cancelled,
            ],
            WorkStatus::Succeeded | WorkStatus::Failed | WorkStatus::Cancelled => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: WorkStatus, to: WorkStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a transition, returning an error message for invalid ones.
    pub fn validate_transition(from: WorkStatus, to: WorkStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!("Invalid transition: {from} -> {to}"))
        }
    }
}
