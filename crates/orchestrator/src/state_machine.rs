use buildcast_core::SequenceStatus;

use crate::error::{OrchestratorError, Result};

/// Allowed status changes for one sequence run:
///
/// `Idle -> Validating -> Generating(0) -> ... -> Generating(n-1) -> Completed`,
/// where validation and any generating stage may drop to `Failed`. A run with
/// zero stages goes straight from `Validating` to `Completed`.
pub struct SequenceStateMachine;

impl SequenceStateMachine {
    pub fn validate_transition(from: &SequenceStatus, to: &SequenceStatus) -> Result<()> {
        if Self::is_allowed(from, to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: *from,
                to: *to,
            })
        }
    }

    fn is_allowed(from: &SequenceStatus, to: &SequenceStatus) -> bool {
        use buildcast_core::SequenceStatus::*;

        match (from, to) {
            (Idle, Validating) => true,
            (Validating, Generating { stage: 0 }) => true,
            (Validating, Completed | Failed) => true,
            (Generating { stage: current }, Generating { stage: next }) => *next == current + 1,
            (Generating { .. }, Completed | Failed) => true,
            _ => false,
        }
    }
}
