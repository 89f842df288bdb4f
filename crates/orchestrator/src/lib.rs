//! Sequential construction-sequence orchestration.
//!
//! [`SequenceOrchestrator`] walks the requested stages in order, builds each
//! stage prompt from the phase catalog, asks an [`imagen::ImageGenerator`]
//! for one image per stage and reports progress as it goes.

pub mod error;
pub mod progress;
pub mod sequence;
pub mod state_machine;

pub use error::{OrchestratorError, Result};
pub use progress::{NoopProgress, ProgressSink, TracingProgress};
pub use sequence::{generate_sequence, SequenceOrchestrator};
pub use state_machine::SequenceStateMachine;
