//! Core configuration
//!
//! One plain config struct threaded through the orchestrator at construction
//! time; nothing global, nothing read from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Minimum confidence a prediction must reach to be reported
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Configuration for the inference core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Root directory for cached model artifacts (e.g. `~/.edgemind/models`)
    pub cache_dir: PathBuf,
    /// Local model file used when a request does not ask for a runtime
    /// download
    pub default_model_path: Option<PathBuf>,
    /// Classifier confidence threshold (0..1)
    pub confidence_threshold: f32,
    /// Optional cap on the number of predictions returned per classify call
    pub max_predictions: Option<usize>,
    /// Optional per-call deadline for text generation; unlimited when unset
    pub generation_timeout: Option<Duration>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(".edgemind")
                .join("models"),
            default_model_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_predictions: None,
            generation_timeout: None,
        }
    }
}

impl CoreConfig {
    /// Set the artifact cache directory
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set the local model file used without runtime download
    pub fn with_default_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_model_path = Some(path.into());
        self
    }

    /// Set the classifier confidence threshold
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Cap the number of predictions returned per classify call
    pub fn with_max_predictions(mut self, cap: usize) -> Self {
        self.max_predictions = Some(cap);
        self
    }

    /// Set the per-call generation deadline
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }
}
