//! Image classifier adapter
//!
//! Thin adapter between the orchestrator and an external [`LabelDetector`].
//! Owns the confidence threshold, re-applies it to whatever the detector
//! returns, and maps detector failures into the boundary error taxonomy.

use edgemind_kernel::capability::LabelDetector;
use edgemind_kernel::error::{CoreError, CoreResult, EngineError};
use edgemind_kernel::types::Prediction;
use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;

/// Classifies decoded images through an external label detector.
///
/// The threshold is fixed at construction; results below it are dropped even
/// if the detector reports them. Detector ordering is preserved.
pub struct ImageClassifier {
    detector: Arc<dyn LabelDetector>,
    threshold: f32,
    max_predictions: Option<usize>,
}

impl ImageClassifier {
    /// Create a classifier with the default 0.7 threshold and no result cap
    pub fn new(detector: Arc<dyn LabelDetector>) -> Self {
        Self {
            detector,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_predictions: None,
        }
    }

    /// Set the confidence threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Cap the number of predictions returned
    pub fn with_max_predictions(mut self, cap: usize) -> Self {
        self.max_predictions = Some(cap);
        self
    }

    /// Configured confidence threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Run label detection on a decoded image.
    ///
    /// Returns predictions at or above the threshold in the detector's
    /// native order, possibly empty. Detector failures surface as
    /// `ClassificationFailed`.
    pub async fn classify(&self, image: &DynamicImage) -> CoreResult<Vec<Prediction>> {
        let detections = self
            .detector
            .detect(image, self.threshold)
            .await
            .map_err(|err| match err {
                EngineError::Detection(msg) => CoreError::ClassificationFailed(msg),
                other => CoreError::ClassificationFailed(other.to_string()),
            })?;

        let mut predictions: Vec<Prediction> = detections
            .into_iter()
            .filter(|p| p.confidence >= self.threshold)
            .collect();
        if let Some(cap) = self.max_predictions {
            predictions.truncate(cap);
        }

        debug!(
            count = predictions.len(),
            threshold = self.threshold,
            "image classified"
        );
        Ok(predictions)
    }
}
