//! Inference session manager
//!
//! Owns the single live text-generation session. A `generate` call resolves
//! the model file, (re)initializes the engine when the requested
//! (source, config) pair differs from the active one, and reuses the live
//! session otherwise. The whole path holds one async mutex, so
//! initialization is single-flight and "at most one live session" holds by
//! construction.

use edgemind_kernel::capability::{GenerationEngine, GenerationSession};
use edgemind_kernel::error::{CoreError, CoreResult, EngineError};
use edgemind_kernel::types::{GenerateTextResponse, GenerationConfig, ModelDescriptor};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::artifacts::ArtifactCache;

// ============================================================================
// Session State
// ============================================================================

/// Lifecycle of the managed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live session exists
    Uninitialized,
    /// Engine construction is in progress
    Initializing,
    /// A live session is ready for reuse
    Ready,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        }
    }
}

/// Where the model file for a call comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Remote artifact resolved through the cache
    Remote(ModelDescriptor),
    /// Preconfigured local file, used without any network activity
    Local(PathBuf),
}

// ============================================================================
// Session Manager
// ============================================================================

/// One live engine session bound to the pair it was constructed with
struct ActiveSession {
    source: ModelSource,
    config: GenerationConfig,
    session: Box<dyn GenerationSession>,
}

/// Manages the lazily-constructed, reusable generation session.
///
/// Reuse is keyed on (model source, generation config) equality: any change
/// tears down the live session and initializes a fresh engine. Failed
/// initialization leaves the slot empty so the next call retries from
/// scratch; failed generation keeps the session, since the engine itself is
/// still valid.
pub struct SessionManager {
    engine: Arc<dyn GenerationEngine>,
    cache: Arc<ArtifactCache>,
    /// Single-flight slot: held across resolve + init + generate
    active: Mutex<Option<ActiveSession>>,
    /// Observable mirror of the lifecycle, readable without awaiting
    state: RwLock<SessionState>,
    generation_timeout: Option<Duration>,
}

impl SessionManager {
    /// Create a manager with no live session.
    pub fn new(engine: Arc<dyn GenerationEngine>, cache: Arc<ArtifactCache>) -> Self {
        Self {
            engine,
            cache,
            active: Mutex::new(None),
            state: RwLock::new(SessionState::Uninitialized),
            generation_timeout: None,
        }
    }

    /// Set a per-call generation deadline
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Tear down the live session, if any.
    ///
    /// The next `generate` call initializes from scratch.
    pub async fn reset(&self) {
        let mut slot = self.active.lock().await;
        if slot.take().is_some() {
            info!("generation session discarded");
        }
        self.set_state(SessionState::Uninitialized);
    }

    /// Produce text for `prompt` against the given model source and config.
    ///
    /// Dropping the returned future abandons the call; a partially
    /// constructed session is discarded and the next call starts clean.
    ///
    /// # Errors
    /// - `Download`: the model artifact could not be fetched
    /// - `ModelInitFailed`: engine construction failed, or the local model
    ///   file is missing
    /// - `GenerationFailed`: the engine failed mid-generation, or the
    ///   configured deadline elapsed
    pub async fn generate(
        &self,
        prompt: &str,
        source: &ModelSource,
        config: &GenerationConfig,
    ) -> CoreResult<GenerateTextResponse> {
        let mut slot = self.active.lock().await;

        let matches_active = slot
            .as_ref()
            .is_some_and(|s| s.source == *source && s.config == *config);

        if !matches_active {
            if slot.take().is_some() {
                info!("generation parameters changed; discarding live session");
            }
            self.set_state(SessionState::Uninitialized);

            let model_path = self.resolve_model_path(source).await?;

            self.set_state(SessionState::Initializing);
            let session = match self.engine.init(&model_path, config).await {
                Ok(session) => session,
                Err(err) => {
                    self.set_state(SessionState::Uninitialized);
                    warn!(
                        model = %model_path.display(),
                        error = %err,
                        "generation engine init failed"
                    );
                    return Err(CoreError::ModelInitFailed(engine_message(err)));
                }
            };
            info!(
                model = %model_path.display(),
                max_tokens = config.max_tokens,
                temperature = config.temperature,
                "generation session initialized"
            );
            *slot = Some(ActiveSession {
                source: source.clone(),
                config: config.clone(),
                session,
            });
            self.set_state(SessionState::Ready);
        }

        let Some(active) = slot.as_mut() else {
            // Unreachable: the slot is populated above on every path
            return Err(CoreError::model_init("session slot empty"));
        };

        let result = match self.generation_timeout {
            Some(limit) => match tokio::time::timeout(limit, active.session.generate(prompt)).await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?limit, "generation deadline exceeded");
                    return Err(CoreError::GenerationFailed(format!(
                        "generation exceeded the {limit:?} deadline"
                    )));
                }
            },
            None => active.session.generate(prompt).await,
        };

        let response = result.map_err(|err| {
            warn!(error = %err, "generation failed");
            CoreError::GenerationFailed(engine_message(err))
        })?;

        let tokens_used = (response.len() / 4) as u32;
        Ok(GenerateTextResponse {
            response,
            tokens_used,
        })
    }

    async fn resolve_model_path(&self, source: &ModelSource) -> CoreResult<PathBuf> {
        match source {
            ModelSource::Remote(descriptor) => Ok(self.cache.resolve(descriptor).await?),
            ModelSource::Local(path) => {
                if path.exists() {
                    Ok(path.clone())
                } else {
                    Err(CoreError::model_init(format!(
                        "model not found at {}; install it or request a runtime download",
                        path.display()
                    )))
                }
            }
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }
}

fn engine_message(err: EngineError) -> String {
    match err {
        EngineError::Init(msg) | EngineError::Generation(msg) | EngineError::Detection(msg) => msg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine stub that counts constructions and scripts session behavior.
    struct StubEngine {
        init_calls: Arc<AtomicUsize>,
        fail_init: bool,
    }

    struct StubSession {
        reply: String,
    }

    #[async_trait]
    impl GenerationEngine for StubEngine {
        async fn init(
            &self,
            model_path: &Path,
            _config: &GenerationConfig,
        ) -> Result<Box<dyn GenerationSession>, EngineError> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(EngineError::Init("corrupt weights".to_string()));
            }
            Ok(Box::new(StubSession {
                reply: format!("loaded {}", model_path.display()),
            }))
        }
    }

    #[async_trait]
    impl GenerationSession for StubSession {
        async fn generate(&mut self, prompt: &str) -> Result<String, EngineError> {
            Ok(format!("{}: {prompt}", self.reply))
        }
    }

    fn local_model(dir: &tempfile::TempDir) -> ModelSource {
        let path = dir.path().join("model.task");
        std::fs::write(&path, b"weights").unwrap();
        ModelSource::Local(path)
    }

    fn manager(fail_init: bool, counter: Arc<AtomicUsize>) -> SessionManager {
        let engine = Arc::new(StubEngine {
            init_calls: counter,
            fail_init,
        });
        let cache = Arc::new(ArtifactCache::new(std::env::temp_dir().join("edgemind-unused")));
        SessionManager::new(engine, cache)
    }

    #[tokio::test]
    async fn test_session_is_reused_for_same_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let source = local_model(&dir);
        let inits = Arc::new(AtomicUsize::new(0));
        let manager = manager(false, inits.clone());
        let config = GenerationConfig::default();

        manager.generate("one", &source, &config).await.unwrap();
        manager.generate("two", &source, &config).await.unwrap();

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_config_change_forces_reinit() {
        let dir = tempfile::tempdir().unwrap();
        let source = local_model(&dir);
        let inits = Arc::new(AtomicUsize::new(0));
        let manager = manager(false, inits.clone());

        let base = GenerationConfig::default();
        manager.generate("one", &source, &base).await.unwrap();

        let hotter = base.clone().with_temperature(0.9);
        manager.generate("two", &source, &hotter).await.unwrap();

        assert_eq!(inits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_init_failure_leaves_uninitialized_and_next_call_retries() {
        let dir = tempfile::tempdir().unwrap();
        let source = local_model(&dir);
        let inits = Arc::new(AtomicUsize::new(0));
        let manager = manager(true, inits.clone());
        let config = GenerationConfig::default();

        let err = manager.generate("one", &source, &config).await.unwrap_err();
        assert_eq!(err.code(), "model/init-failed");
        assert_eq!(manager.state(), SessionState::Uninitialized);

        // No session survived the failed attempt; the next call starts over
        let err = manager.generate("two", &source, &config).await.unwrap_err();
        assert_eq!(err.code(), "model/init-failed");
        assert_eq!(inits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_local_model_is_init_failure() {
        let inits = Arc::new(AtomicUsize::new(0));
        let manager = manager(false, inits.clone());
        let source = ModelSource::Local(PathBuf::from("/nonexistent/model.task"));

        let err = manager
            .generate("one", &source, &GenerationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "model/init-failed");
        // The engine was never consulted
        assert_eq!(inits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tokens_used_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let source = local_model(&dir);
        let manager = manager(false, Arc::new(AtomicUsize::new(0)));

        let response = manager
            .generate("hello", &source, &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(response.tokens_used, (response.response.len() / 4) as u32);
    }

    #[tokio::test]
    async fn test_reset_discards_session() {
        let dir = tempfile::tempdir().unwrap();
        let source = local_model(&dir);
        let inits = Arc::new(AtomicUsize::new(0));
        let manager = manager(false, inits.clone());
        let config = GenerationConfig::default();

        manager.generate("one", &source, &config).await.unwrap();
        manager.reset().await;
        assert_eq!(manager.state(), SessionState::Uninitialized);

        manager.generate("two", &source, &config).await.unwrap();
        assert_eq!(inits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_state_as_str() {
        assert_eq!(SessionState::Uninitialized.as_str(), "uninitialized");
        assert_eq!(SessionState::Initializing.as_str(), "initializing");
        assert_eq!(SessionState::Ready.as_str(), "ready");
    }
}
