use serde::{Deserialize, Serialize};

/// Lifecycle of a single `generate_sequence` call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SequenceStatus {
    #[default]
    Idle,
    Validating,
    /// Working on the 0-based `stage`.
    Generating { stage: usize },
    Completed,
    Failed,
}

impl SequenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Generating { .. } => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SequenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generating { stage } => write!(f, "generating(stage={})", stage),
            other => f.write_str(other.as_str()),
        }
    }
}
