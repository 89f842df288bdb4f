use buildcast_core::SequenceStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Raised before any request is sent.
    #[error("{0}")]
    Configuration(String),

    /// A stage failed. `stage` is 1-based.
    #[error(
        "Failed to generate image for stage {stage}. Please try again or modify your prompt. Reason: {reason}"
    )]
    Generation { stage: usize, reason: String },

    #[error("Invalid sequence transition from {from} to {to}")]
    InvalidTransition {
        from: SequenceStatus,
        to: SequenceStatus,
    },
}

impl OrchestratorError {
    pub fn missing_credential() -> Self {
        Self::Configuration("API Key is not provided. Please set it in the application.".to_string())
    }

    pub fn generation(stage: usize, reason: impl Into<String>) -> Self {
        Self::Generation {
            stage,
            reason: reason.into(),
        }
    }

    /// 1-based stage a generation failure happened at.
    pub fn stage(&self) -> Option<usize> {
        match self {
            Self::Generation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message() {
        let err = OrchestratorError::missing_credential();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "API Key is not provided. Please set it in the application."
        );
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_generation_message_names_stage_and_reason() {
        let err = OrchestratorError::generation(3, "quota exceeded");
        assert_eq!(err.stage(), Some(3));
        assert_eq!(
            err.to_string(),
            "Failed to generate image for stage 3. Please try again or modify your prompt. Reason: quota exceeded"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = OrchestratorError::InvalidTransition {
            from: SequenceStatus::Completed,
            to: SequenceStatus::Generating { stage: 0 },
        };
        assert_eq!(
            err.to_string(),
            "Invalid sequence transition from completed to generating(stage=0)"
        );
    }
}
