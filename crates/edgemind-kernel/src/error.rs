//! Error taxonomy for the inference core
//!
//! One enum per pipeline stage, folded into the [`CoreError`] umbrella that is
//! the only error shape crossing the orchestration boundary. Every variant
//! carries a human-readable message and maps to a stable machine-readable code
//! via [`CoreError::code`], so hosts can switch on codes while logs stay
//! legible.

use serde::{Deserialize, Serialize};

// ============================================================================
// Stage Errors
// ============================================================================

/// Image decoding errors
///
/// Raised while turning an untrusted base64 payload into an in-memory image,
/// before any engine is involved.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    /// Payload carried a `data:image/` marker but did not split into exactly
    /// two comma-separated parts
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Payload text is not decodable base64
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// Decoded bytes do not parse as a supported image format
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Model artifact download errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum DownloadError {
    /// Server answered with a non-200 status
    #[error("Download failed with HTTP status {0}: {1}")]
    HttpStatus(u16, String),

    /// Network stream or filesystem failure, including truncated bodies
    #[error("Download I/O failure: {0}")]
    IoFailure(String),

    /// Connect or read deadline exceeded
    #[error("Download timed out: {0}")]
    Timeout(String),

    /// Streamed bytes did not hash to the digest the descriptor promised
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Errors reported by the external engine capabilities
///
/// Engine implementations return these; the core maps them into [`CoreError`]
/// variants at the call site (init failures and generation failures land in
/// different buckets, so no blanket `From` exists).
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Engine construction failed (bad model file, missing weights, OOM)
    #[error("Engine init failed: {0}")]
    Init(String),

    /// A live session failed to produce a response
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The label detector failed on a decoded image
    #[error("Detection failed: {0}")]
    Detection(String),
}

// ============================================================================
// CoreError - Umbrella Type
// ============================================================================

/// Umbrella error returned by every orchestrator operation
///
/// Mirrors the failure taxonomy of the boundary contract: decode, classify,
/// download, session, and validation failures each keep their own identity so
/// hosts can react per kind.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// Image payload could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The label detector reported a failure
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    /// Model artifact could not be fetched
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Engine construction failed, or no usable model source was configured
    #[error("Model initialization failed: {0}")]
    ModelInitFailed(String),

    /// A live engine session failed to produce text
    #[error("Text generation failed: {0}")]
    GenerationFailed(String),

    /// Request rejected before any async work started
    #[error("Invalid request: {0}")]
    Validation(String),
}

/// Result type for all orchestrator operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    // ---- Constructors ----

    /// Create a classification error
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::ClassificationFailed(msg.into())
    }

    /// Create a model-init error
    pub fn model_init(msg: impl Into<String>) -> Self {
        Self::ModelInitFailed(msg.into())
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::GenerationFailed(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    // ---- Classification ----

    /// Stable machine-readable code for this error
    ///
    /// Codes are part of the boundary contract: hosts match on them, so they
    /// never change once published.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(DecodeError::InvalidDataUri(_)) => "decode/invalid-data-uri",
            Self::Decode(DecodeError::InvalidBase64(_)) => "decode/invalid-base64",
            Self::Decode(DecodeError::UnsupportedFormat(_)) => "decode/unsupported-format",
            Self::ClassificationFailed(_) => "classify/failed",
            Self::Download(DownloadError::HttpStatus(..)) => "download/http-status",
            Self::Download(DownloadError::IoFailure(_)) => "download/io",
            Self::Download(DownloadError::Timeout(_)) => "download/timeout",
            Self::Download(DownloadError::ChecksumMismatch { .. }) => "download/checksum-mismatch",
            Self::ModelInitFailed(_) => "model/init-failed",
            Self::GenerationFailed(_) => "generate/failed",
            Self::Validation(_) => "request/validation",
        }
    }

    /// Whether the request was rejected before any async work started
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Render this error as the wire envelope
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

// ============================================================================
// ErrorBody - Wire Envelope
// ============================================================================

/// Serialized error envelope sent across the host boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code (see [`CoreError::code`])
    pub code: String,
    /// Human-readable detail message
    pub message: String,
}

impl From<&CoreError> for ErrorBody {
    fn from(err: &CoreError) -> Self {
        err.to_body()
    }
}
