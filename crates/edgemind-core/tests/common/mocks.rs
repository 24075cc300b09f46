//! Mock inference capabilities for `edgemind-core` integration tests.
//!
//! [`MockDetector`] implements [`LabelDetector`] and [`MockEngine`] implements
//! [`GenerationEngine`]; together they are the canonical test doubles for the
//! orchestration end-to-end tests.  Both record every call and return
//! configurable results queued at construction time, falling back to sensible
//! defaults when the queue is empty.
//!
//! # Design goals
//!
//! | Goal | Mechanism |
//! |------|-----------|
//! | Deterministic | Results queued at build time; no random state |
//! | Observable | `call_count()`, `init_call_count()`, `last_init()`, … |
//! | Composable | Builder adds results one-by-one in FIFO order |
//! | Thread-safe | Internal state protected by `Arc<Mutex<…>>` |
//! | Explicit errors | `fail_with()` / `fail_init_with()` force typed errors |

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use edgemind_kernel::capability::{GenerationEngine, GenerationSession, LabelDetector};
use edgemind_kernel::error::EngineError;
use edgemind_kernel::types::{GenerationConfig, Prediction};
use image::DynamicImage;

// ─────────────────────────────────────────────────────────────────────────────
// Mock label detector
// ─────────────────────────────────────────────────────────────────────────────

/// Recorded calls and queued results belonging to one [`MockDetector`].
struct DetectorState {
    /// Threshold passed to every `detect` call, in call order
    thresholds: Vec<f32>,
    /// FIFO queue of results; when empty, one high-confidence default
    /// prediction is returned
    results: VecDeque<Result<Vec<Prediction>, EngineError>>,
}

/// Deterministic [`LabelDetector`] double.
#[derive(Clone)]
pub struct MockDetector {
    state: Arc<Mutex<DetectorState>>,
}

impl MockDetector {
    pub fn builder() -> MockDetectorBuilder {
        MockDetectorBuilder {
            results: VecDeque::new(),
        }
    }

    /// Number of `detect` invocations so far
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().thresholds.len()
    }

    /// Threshold passed to the most recent `detect` call
    pub fn last_threshold(&self) -> Option<f32> {
        self.state.lock().unwrap().thresholds.last().copied()
    }
}

pub struct MockDetectorBuilder {
    results: VecDeque<Result<Vec<Prediction>, EngineError>>,
}

impl MockDetectorBuilder {
    /// Queue one successful detection result
    pub fn detect_with(mut self, predictions: Vec<Prediction>) -> Self {
        self.results.push_back(Ok(predictions));
        self
    }

    /// Queue one detection failure
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.results
            .push_back(Err(EngineError::Detection(message.into())));
        self
    }

    pub fn build(self) -> MockDetector {
        MockDetector {
            state: Arc::new(Mutex::new(DetectorState {
                thresholds: Vec::new(),
                results: self.results,
            })),
        }
    }
}

#[async_trait]
impl LabelDetector for MockDetector {
    async fn detect(
        &self,
        _image: &DynamicImage,
        threshold: f32,
    ) -> Result<Vec<Prediction>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.thresholds.push(threshold);
        state
            .results
            .pop_front()
            .unwrap_or_else(|| Ok(vec![Prediction::new("mock-label", 0.92)]))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock generation engine
// ─────────────────────────────────────────────────────────────────────────────

/// Recorded calls and queued results belonging to one [`MockEngine`].
struct EngineState {
    /// (model path, config) of every `init` call, in call order
    init_calls: Vec<(PathBuf, GenerationConfig)>,
    /// FIFO queue of init outcomes; `Err` makes that `init` call fail.
    /// When empty, init succeeds.
    init_results: VecDeque<Result<(), EngineError>>,
    /// FIFO queue of generation replies shared by all minted sessions.
    /// When empty, a default completion echoing the prompt is returned.
    replies: VecDeque<Result<String, EngineError>>,
    /// Pause applied before every reply is produced
    reply_delay: Option<Duration>,
}

/// Deterministic [`GenerationEngine`] double.
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MockEngine {
    pub fn builder() -> MockEngineBuilder {
        MockEngineBuilder {
            init_results: VecDeque::new(),
            replies: VecDeque::new(),
            reply_delay: None,
        }
    }

    /// Number of `init` invocations so far
    pub fn init_call_count(&self) -> usize {
        self.state.lock().unwrap().init_calls.len()
    }

    /// (model path, config) of the most recent `init` call
    pub fn last_init(&self) -> Option<(PathBuf, GenerationConfig)> {
        self.state.lock().unwrap().init_calls.last().cloned()
    }
}

pub struct MockEngineBuilder {
    init_results: VecDeque<Result<(), EngineError>>,
    replies: VecDeque<Result<String, EngineError>>,
    reply_delay: Option<Duration>,
}

impl MockEngineBuilder {
    /// Queue one successful init
    pub fn init_ok(mut self) -> Self {
        self.init_results.push_back(Ok(()));
        self
    }

    /// Queue one init failure
    pub fn fail_init_with(mut self, message: impl Into<String>) -> Self {
        self.init_results
            .push_back(Err(EngineError::Init(message.into())));
        self
    }

    /// Queue one generation reply
    pub fn reply_with(mut self, text: impl Into<String>) -> Self {
        self.replies.push_back(Ok(text.into()));
        self
    }

    /// Queue one generation failure
    pub fn fail_generation_with(mut self, message: impl Into<String>) -> Self {
        self.replies
            .push_back(Err(EngineError::Generation(message.into())));
        self
    }

    /// Pause every generation for `delay` before its reply is produced
    pub fn stall_generation_for(mut self, delay: Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    pub fn build(self) -> MockEngine {
        MockEngine {
            state: Arc::new(Mutex::new(EngineState {
                init_calls: Vec::new(),
                init_results: self.init_results,
                replies: self.replies,
                reply_delay: self.reply_delay,
            })),
        }
    }
}

#[async_trait]
impl GenerationEngine for MockEngine {
    async fn init(
        &self,
        model_path: &Path,
        config: &GenerationConfig,
    ) -> Result<Box<dyn GenerationSession>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state
            .init_calls
            .push((model_path.to_path_buf(), config.clone()));
        if let Some(outcome) = state.init_results.pop_front() {
            outcome?;
        }
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Session minted by [`MockEngine::init`]; replies come from the shared queue.
struct MockSession {
    state: Arc<Mutex<EngineState>>,
}

#[async_trait]
impl GenerationSession for MockSession {
    async fn generate(&mut self, prompt: &str) -> Result<String, EngineError> {
        // The std mutex guard must not live across the sleep
        let delay = self.state.lock().unwrap().reply_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok(format!("mock completion for: {prompt}")))
    }
}
