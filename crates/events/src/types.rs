//! Event types emitted while a construction sequence is generated

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// Position in the publishing bus's stream, starting at 0
    pub sequence: u64,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(sequence: u64, event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Everything a sequence run reports. Stage numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Credential accepted, about to generate the first stage
    #[serde(rename = "sequence.started")]
    SequenceStarted { sequence_id: Uuid, total_stages: usize },

    /// A request for one stage is about to be sent
    #[serde(rename = "stage.started")]
    StageStarted {
        sequence_id: Uuid,
        stage: usize,
        total_stages: usize,
        prompt: String,
    },

    /// The service returned an image for a stage
    #[serde(rename = "stage.completed")]
    StageCompleted {
        sequence_id: Uuid,
        stage: usize,
        mime_type: String,
    },

    /// Every stage produced an image
    #[serde(rename = "sequence.completed")]
    SequenceCompleted { sequence_id: Uuid, image_count: usize },

    /// The run stopped. `stage` is absent when it never got past validation.
    #[serde(rename = "sequence.failed")]
    SequenceFailed {
        sequence_id: Uuid,
        stage: Option<usize>,
        message: String,
    },
}

impl Event {
    pub fn sequence_id(&self) -> Uuid {
        match self {
            Event::SequenceStarted { sequence_id, .. }
            | Event::StageStarted { sequence_id, .. }
            | Event::StageCompleted { sequence_id, .. }
            | Event::SequenceCompleted { sequence_id, .. }
            | Event::SequenceFailed { sequence_id, .. } => *sequence_id,
        }
    }

    /// The wire name used in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SequenceStarted { .. } => "sequence.started",
            Event::StageStarted { .. } => "stage.started",
            Event::StageCompleted { .. } => "stage.completed",
            Event::SequenceCompleted { .. } => "sequence.completed",
            Event::SequenceFailed { .. } => "sequence.failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::SequenceCompleted { .. } | Event::SequenceFailed { .. }
        )
    }
}
