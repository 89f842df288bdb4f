//! Core domain types for buildcast.
//!
//! Holds the construction phase catalog and the stage-to-prompt mapping,
//! plus the small value types shared by the client and orchestrator crates.

pub mod domain;
pub mod error;

pub use domain::credential::Credential;
pub use domain::image::GeneratedImage;
pub use domain::phase::{map_stage_to_prompt, GenerationRequest, PhaseCatalog, QUALITY_SUFFIX};
pub use domain::sequence::SequenceStatus;
pub use error::{CoreError, Result};
