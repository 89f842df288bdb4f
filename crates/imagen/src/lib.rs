//! Client for the external image-generation service.
//!
//! [`ImageGenerator`] is the seam the orchestrator depends on;
//! [`ImagenClient`] implements it over the Gemini `:predict` REST endpoint.

pub mod client;
pub mod error;
pub mod generator;
pub mod types;

pub use client::{ImagenClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{ImagenError, Result};
pub use generator::ImageGenerator;
pub use types::*;
