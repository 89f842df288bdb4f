use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Appended to every stage prompt when more than one stage is requested.
pub const QUALITY_SUFFIX: &str = "Photorealistic, high-resolution, detailed architecture.";

const CONSTRUCTION_PHASES: [&str; 10] = [
    "in an empty lot before construction, site cleared for development.",
    "at the very beginning of construction, with heavy machinery doing excavation and foundation work.",
    "with the foundational structure and the first few floors' framework being erected.",
    "with the core structure and steel or concrete framework about one-third complete.",
    "with the structural frame halfway to its full height, showing significant progress.",
    "as the main structural frame reaches its full height, topping out.",
    "with the exterior cladding and glass facade being installed on the lower half of the building.",
    "with most of the exterior facade complete, and large cranes still attached to the top.",
    "nearing completion, with exterior work finished and interior work underway, landscaping begins at the base.",
    "fully completed, newly finished, and shining, ready for its grand opening.",
];

/// Ordered list of construction phase descriptions.
///
/// Index 0 is the earliest phase (empty lot), the last index is the finished
/// building. Requested stages are linearly re-sampled onto this list, so the
/// catalog can be any non-empty length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PhaseCatalogFile")]
pub struct PhaseCatalog {
    phases: Vec<String>,
}

impl PhaseCatalog {
    /// Build a catalog from custom descriptors.
    pub fn new<I, S>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phases: Vec<String> = descriptors.into_iter().map(Into::into).collect();
        if phases.is_empty() {
            return Err(CoreError::Validation(
                "phase catalog must contain at least one descriptor".to_string(),
            ));
        }
        Ok(Self { phases })
    }

    /// The built-in ten-phase construction catalog.
    pub fn construction() -> Self {
        Self {
            phases: CONSTRUCTION_PHASES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Parse a catalog from a TOML document of the form `phases = ["..."]`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let parsed: PhaseCatalogFile = toml::from_str(content)?;
        Self::try_from(parsed)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn descriptor(&self, index: usize) -> Option<&str> {
        self.phases.get(index).map(String::as_str)
    }

    pub fn final_descriptor(&self) -> &str {
        // non-empty by construction
        &self.phases[self.phases.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(String::as_str)
    }

    /// Map a 0-based stage onto a catalog index.
    ///
    /// A single-stage sequence always lands on the final phase. Otherwise the
    /// first stage lands on index 0 and the last stage on the final index, with
    /// the stages in between spread by rounding. Stages past the end are clamped.
    pub fn phase_index(&self, stage: usize, total_stages: usize) -> usize {
        let last = self.phases.len() - 1;
        if total_stages <= 1 {
            return last;
        }

        let position = stage as f64 / (total_stages - 1) as f64;
        let index = (position * last as f64).round() as usize;
        index.min(last)
    }

    /// Build the prompt sent to the image generator for one stage.
    ///
    /// The quality suffix is only added when more than one stage is requested.
    pub fn stage_prompt(&self, base_prompt: &str, stage: usize, total_stages: usize) -> String {
        if total_stages <= 1 {
            return format!("{}, {}", base_prompt, self.final_descriptor());
        }

        let phase = &self.phases[self.phase_index(stage, total_stages)];
        format!("{}, {} {}", base_prompt, phase, QUALITY_SUFFIX)
    }
}

impl Default for PhaseCatalog {
    fn default() -> Self {
        Self::construction()
    }
}

#[derive(Debug, Deserialize)]
struct PhaseCatalogFile {
    phases: Vec<String>,
}

impl TryFrom<PhaseCatalogFile> for PhaseCatalog {
    type Error = CoreError;

    fn try_from(file: PhaseCatalogFile) -> Result<Self> {
        Self::new(file.phases)
    }
}

/// Stage prompt using the built-in construction catalog.
pub fn map_stage_to_prompt(base_prompt: &str, stage: usize, total_stages: usize) -> String {
    PhaseCatalog::construction().stage_prompt(base_prompt, stage, total_stages)
}

/// One stage of a requested sequence. Built per stage and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub base_prompt: String,
    pub stage_index: usize,
    pub total_stages: usize,
}

impl GenerationRequest {
    pub fn new(base_prompt: impl Into<String>, stage_index: usize, total_stages: usize) -> Self {
        Self {
            base_prompt: base_prompt.into(),
            stage_index,
            total_stages,
        }
    }

    /// 1-based stage number, as shown to users.
    pub fn stage_number(&self) -> usize {
        self.stage_index + 1
    }

    pub fn prompt(&self, catalog: &PhaseCatalog) -> String {
        catalog.stage_prompt(&self.base_prompt, self.stage_index, self.total_stages)
    }
}
