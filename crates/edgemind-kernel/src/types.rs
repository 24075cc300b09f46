//! Boundary wire types and model/config descriptors
//!
//! The request/response structs mirror the host-facing JSON contract
//! (camelCase field names, bridge-side defaults baked in via serde). The
//! descriptor and generation-config types are the internal currency passed
//! between the orchestrator, the artifact cache, and the engines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default token budget applied when a request omits `maxTokens`
pub const DEFAULT_MAX_TOKENS: u32 = 100;

/// Default sampling temperature applied when a request omits `temperature`
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Model file name used when neither the descriptor nor its URL yields one
pub const DEFAULT_MODEL_FILE_NAME: &str = "model.task";

// ============================================================================
// Classification Types
// ============================================================================

/// One detected label with its confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Textual classification tag
    pub label: String,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

// ============================================================================
// Request / Response Types
// ============================================================================

/// `echo` request, a liveness check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoRequest {
    pub value: String,
}

/// `echo` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoResponse {
    pub value: String,
}

/// `version` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// `classifyImage` request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyImageRequest {
    /// Raw base64 image payload, optionally `data:image/...;base64,` prefixed
    pub base64_image: String,
}

/// `classifyImage` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyImageResponse {
    /// Predictions at or above the configured threshold, detector order
    pub predictions: Vec<Prediction>,
}

/// `generateText` request
///
/// `maxTokens` and `temperature` default at the boundary; the remaining
/// sampling knobs stay unset unless the host provides them, and engines fall
/// back to their own defaults for unset fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextRequest {
    pub prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config: Option<ModelConfig>,
}

impl GenerateTextRequest {
    /// Build a request with boundary defaults for everything but the prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_k: None,
            top_p: None,
            random_seed: None,
            model_config: None,
        }
    }

    /// Sampling parameters of this request as an engine-facing config
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            random_seed: self.random_seed,
        }
    }
}

/// `generateText` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextResponse {
    /// Generated text
    pub response: String,
    /// Heuristic token count: `floor(len(response) / 4)`
    pub tokens_used: u32,
}

/// Host-supplied model source configuration inside `generateText`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// When true, fetch the model over HTTP instead of using the local default
    #[serde(default)]
    pub download_at_runtime: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Expected SHA-256 of the artifact, hex encoded; verified during download
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

// ============================================================================
// Model Descriptor
// ============================================================================

/// Identifies the network source and local file name of a model artifact
///
/// Two descriptors compare equal when they would resolve to the same cached
/// artifact fetched the same way; the session manager uses that equality to
/// decide whether a live session can be reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// HTTP(S) source of the artifact
    pub source_url: String,
    /// Explicit cache file name; derived from the URL when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Bearer token attached as `Authorization` during download
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Extra request headers attached during download
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Expected SHA-256 of the artifact, hex encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ModelDescriptor {
    /// Create a descriptor for a source URL with no auth and a derived name
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            file_name: None,
            auth_token: None,
            headers: HashMap::new(),
            sha256: None,
        }
    }

    /// Set the explicit cache file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the bearer token sent as `Authorization: Bearer <token>`
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add one extra request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the expected artifact digest (hex SHA-256)
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }
}

impl From<&ModelConfig> for ModelDescriptor {
    /// Lift the wire-level model config into a descriptor.
    ///
    /// Callers must have validated `download_url` presence first; an absent
    /// URL maps to an empty string here and fails later as a malformed URL.
    fn from(config: &ModelConfig) -> Self {
        Self {
            source_url: config.download_url.clone().unwrap_or_default(),
            file_name: config.model_file_name.clone(),
            auth_token: config.auth_token.clone(),
            headers: config.headers.clone().unwrap_or_default(),
            sha256: config.sha256.clone(),
        }
    }
}

// ============================================================================
// Generation Config
// ============================================================================

/// Sampling parameters a generation session is constructed with
///
/// Equality over the full parameter set drives session reuse: any change
/// forces a fresh engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Maximum tokens the engine may emit, must be > 0
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature, must be >= 0
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Top-k sampling cutoff; engine default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Nucleus sampling mass in `[0, 1]`; engine default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Seed for reproducible sampling; engine default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_k: None,
            top_p: None,
            random_seed: None,
        }
    }
}

impl GenerationConfig {
    /// Set the token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the top-k cutoff
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the nucleus sampling mass
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the sampling seed
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Validate parameter ranges.
    ///
    /// Returns a message suitable for a boundary validation error; callers
    /// wrap it in their own error type.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("maxTokens must be greater than 0".to_string());
        }
        if self.temperature < 0.0 {
            return Err(format!(
                "temperature must be >= 0, got {}",
                self.temperature
            ));
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(format!("topP must be within [0, 1], got {top_p}"));
            }
        }
        Ok(())
    }
}
