//! Request orchestrator
//!
//! Host-facing surface of the core. Composes the decoder, the classifier
//! adapter, and the session manager behind three async operations plus two
//! diagnostics, and converts every failure into the uniform error taxonomy.
//! Requests are validated before any async work starts.

use edgemind_kernel::capability::{GenerationEngine, LabelDetector};
use edgemind_kernel::error::{CoreError, CoreResult, DecodeError};
use edgemind_kernel::types::{
    ClassifyImageRequest, ClassifyImageResponse, EchoRequest, EchoResponse, GenerateTextRequest,
    GenerateTextResponse, ModelConfig, ModelDescriptor, VersionResponse,
};
use std::sync::Arc;
use tracing::debug;

use crate::artifacts::ArtifactCache;
use crate::classifier::ImageClassifier;
use crate::config::CoreConfig;
use crate::session::{ModelSource, SessionManager, SessionState};
use crate::vision;

/// Uniform async entry point for on-device inference.
///
/// Owns the classifier adapter and the session manager; the artifact cache
/// is shared into the session manager at construction. Calls never panic:
/// every failure surfaces as a [`CoreError`] with a stable code.
pub struct InferenceOrchestrator {
    config: CoreConfig,
    classifier: ImageClassifier,
    sessions: SessionManager,
}

impl InferenceOrchestrator {
    /// Create an orchestrator over the given engine capabilities.
    pub fn new(
        config: CoreConfig,
        detector: Arc<dyn LabelDetector>,
        engine: Arc<dyn GenerationEngine>,
    ) -> Self {
        let cache = Arc::new(ArtifactCache::new(config.cache_dir.clone()));

        let mut classifier =
            ImageClassifier::new(detector).with_threshold(config.confidence_threshold);
        if let Some(cap) = config.max_predictions {
            classifier = classifier.with_max_predictions(cap);
        }

        let mut sessions = SessionManager::new(engine, cache);
        if let Some(timeout) = config.generation_timeout {
            sessions = sessions.with_generation_timeout(timeout);
        }

        Self {
            config,
            classifier,
            sessions,
        }
    }

    /// Liveness check: returns the value unchanged.
    pub fn echo(&self, request: EchoRequest) -> EchoResponse {
        debug!(value = %request.value, "echo");
        EchoResponse {
            value: request.value,
        }
    }

    /// Version of the embedded core, for host-side logging.
    pub fn version(&self) -> VersionResponse {
        VersionResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Lifecycle state of the generation session
    pub fn session_state(&self) -> SessionState {
        self.sessions.state()
    }

    /// Tear down the live generation session, if any.
    pub async fn reset_session(&self) {
        self.sessions.reset().await;
    }

    /// Decode a base64 image payload and run label detection on it.
    ///
    /// Decode work runs on a blocking worker; the async runtime is never
    /// stalled by large payloads.
    pub async fn classify(
        &self,
        request: ClassifyImageRequest,
    ) -> CoreResult<ClassifyImageResponse> {
        if request.base64_image.trim().is_empty() {
            return Err(CoreError::validation("base64Image must not be empty"));
        }

        let payload = request.base64_image;
        let image = tokio::task::spawn_blocking(move || vision::decode_base64_image(&payload))
            .await
            .map_err(|e| {
                DecodeError::UnsupportedFormat(format!("image decoding aborted: {e}"))
            })??;

        let predictions = self.classifier.classify(&image).await?;
        Ok(ClassifyImageResponse { predictions })
    }

    /// Generate text for a prompt, initializing or reusing the session as
    /// needed.
    pub async fn generate(&self, request: GenerateTextRequest) -> CoreResult<GenerateTextResponse> {
        if request.prompt.trim().is_empty() {
            return Err(CoreError::validation("prompt must not be empty"));
        }
        let config = request.generation_config();
        config.validate().map_err(CoreError::Validation)?;
        let source = self.model_source(request.model_config.as_ref())?;

        self.sessions.generate(&request.prompt, &source, &config).await
    }

    /// Effective model source for a request: a runtime download when the
    /// request asks for one, otherwise the configured local model.
    fn model_source(&self, model: Option<&ModelConfig>) -> CoreResult<ModelSource> {
        if let Some(model) = model {
            if model.download_at_runtime {
                if model.download_url.as_deref().is_none_or(str::is_empty) {
                    return Err(CoreError::validation(
                        "modelConfig.downloadUrl is required when downloadAtRuntime is true",
                    ));
                }
                return Ok(ModelSource::Remote(ModelDescriptor::from(model)));
            }
        }
        match &self.config.default_model_path {
            Some(path) => Ok(ModelSource::Local(path.clone())),
            None => Err(CoreError::model_init(
                "no model source; set a default model path or request a runtime download",
            )),
        }
    }
}
