//! Capability traits for the external inference engines
//!
//! The orchestration core never implements inference itself; it consumes
//! these traits:
//! - `LabelDetector`: image labeling backend used by the classifier adapter
//! - `GenerationEngine` / `GenerationSession`: text-generation backend owned
//!   by the session manager
//!
//! Engine crates implement these against their native runtime; the core is
//! backend-agnostic.

use crate::error::EngineError;
use crate::types::{GenerationConfig, Prediction};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;

// ============================================================================
// Label Detection
// ============================================================================

/// Image labeling capability
///
/// `detect` may be invoked concurrently from independent classify calls, so
/// implementations must be reentrant; a wrapper around a non-reentrant native
/// handle has to serialize internally (the core adds no lock of its own).
#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Run label detection on a decoded image.
    ///
    /// `threshold` is the minimum confidence a label must reach to be
    /// reported; detectors that cannot filter natively may return everything
    /// and rely on the caller's re-filter.
    ///
    /// Results keep the detector's native ordering and may be empty.
    ///
    /// # Errors
    /// - `EngineError::Detection`: the backend failed on this image
    async fn detect(
        &self,
        image: &DynamicImage,
        threshold: f32,
    ) -> Result<Vec<Prediction>, EngineError>;
}

// ============================================================================
// Text Generation
// ============================================================================

/// Factory for text-generation sessions
///
/// One engine instance can mint many sessions over its lifetime; each session
/// binds one model file to one sampling configuration.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Construct a live session from a local model file and sampling config.
    ///
    /// Unset optional sampling fields are filled with engine defaults (the
    /// reference mobile engine uses `top_k = 40`, `random_seed = 101`).
    ///
    /// # Errors
    /// - `EngineError::Init`: model file unreadable, incompatible, or the
    ///   backend ran out of resources
    async fn init(
        &self,
        model_path: &Path,
        config: &GenerationConfig,
    ) -> Result<Box<dyn GenerationSession>, EngineError>;
}

/// A live, stateful handle to an initialized text-generation engine
///
/// Sessions are exclusively owned by their manager and never shared, hence
/// the `&mut self` receiver.
#[async_trait]
pub trait GenerationSession: Send + Sync {
    /// Produce a response for `prompt`.
    ///
    /// # Errors
    /// - `EngineError::Generation`: the backend failed mid-generation
    async fn generate(&mut self, prompt: &str) -> Result<String, EngineError>;
}
