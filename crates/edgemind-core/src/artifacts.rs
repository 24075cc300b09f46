//! Model artifact cache
//!
//! Resolves a [`ModelDescriptor`] to a local file under one cache directory,
//! downloading on miss. Downloads stream to a sibling `.part` file and rename
//! into place on success, so the target path never holds a partial artifact.
//! Resolutions of the same file name serialize on a per-name lock; distinct
//! names download in parallel.
//!
//! Cache hits are returned without re-verification: once a file landed at the
//! target path it is trusted until deleted.

use dashmap::DashMap;
use edgemind_kernel::error::DownloadError;
use edgemind_kernel::types::{DEFAULT_MODEL_FILE_NAME, ModelDescriptor};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Connect timeout for artifact downloads
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read timeout while streaming the body
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Local cache of downloaded model artifacts, keyed by file name.
pub struct ArtifactCache {
    cache_dir: PathBuf,
    client: Client,
    /// One async lock per file name so concurrent resolutions of the same
    /// artifact collapse into a single download
    locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl ArtifactCache {
    /// Create a cache rooted at `cache_dir`.
    ///
    /// The directory is created lazily on the first download, not here.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            cache_dir: cache_dir.into(),
            client,
            locks: DashMap::new(),
        }
    }

    /// Root directory artifacts are cached under
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Local file name for a descriptor: the explicit name when present,
    /// else the URL's final non-empty path segment, else a fixed default.
    pub fn resolve_file_name(descriptor: &ModelDescriptor) -> String {
        if let Some(name) = descriptor.file_name.as_deref() {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        if let Ok(url) = reqwest::Url::parse(&descriptor.source_url) {
            if let Some(segments) = url.path_segments() {
                if let Some(last) = segments.filter(|s| !s.is_empty()).next_back() {
                    return last.to_string();
                }
            }
        }
        DEFAULT_MODEL_FILE_NAME.to_string()
    }

    /// Resolve a descriptor to a local path, downloading on cache miss.
    ///
    /// # Errors
    /// - `HttpStatus`: server answered with a non-200 status
    /// - `Timeout`: connect or read deadline exceeded
    /// - `IoFailure`: stream or filesystem failure, truncated body, or a
    ///   file name that is not a single path component
    /// - `ChecksumMismatch`: descriptor carried a digest the bytes missed
    pub async fn resolve(&self, descriptor: &ModelDescriptor) -> Result<PathBuf, DownloadError> {
        let file_name = Self::resolve_file_name(descriptor);
        // File names join the cache root as a single component; anything
        // that could step outside of it is refused.
        if file_name.contains(['/', '\\']) || file_name == "." || file_name == ".." {
            return Err(DownloadError::IoFailure(format!(
                "invalid model file name {file_name:?}"
            )));
        }
        let target = self.cache_dir.join(&file_name);

        // The lock is taken before the existence check: a resolution that
        // lost the race to a concurrent download of the same name must see
        // the finished file, not start a second transfer.
        let lock = self.locks.entry(file_name.clone()).or_default().clone();
        let _guard = lock.lock().await;

        if target.exists() {
            debug!(path = %target.display(), "model artifact cache hit");
            return Ok(target);
        }

        self.download(descriptor, &target).await?;
        Ok(target)
    }

    /// Download a descriptor's artifact to `target` via a `.part` sibling.
    ///
    /// Caller holds the per-name lock.
    async fn download(
        &self,
        descriptor: &ModelDescriptor,
        target: &Path,
    ) -> Result<(), DownloadError> {
        tokio::fs::create_dir_all(&self.cache_dir).await.map_err(|e| {
            DownloadError::IoFailure(format!(
                "failed to create cache dir {}: {e}",
                self.cache_dir.display()
            ))
        })?;

        info!(
            url = %descriptor.source_url,
            target = %target.display(),
            "downloading model artifact"
        );

        let mut request = self.client.get(&descriptor.source_url);
        if let Some(token) = descriptor.auth_token.as_deref() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(map_request_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(
                status = status.as_u16(),
                url = %descriptor.source_url,
                "model download rejected"
            );
            return Err(DownloadError::HttpStatus(
                status.as_u16(),
                status_detail(status),
            ));
        }

        let part = part_path(target);
        match stream_body(response, &part, descriptor.sha256.as_deref()).await {
            Ok(bytes) => match tokio::fs::rename(&part, target).await {
                Ok(()) => {
                    info!(bytes, path = %target.display(), "model artifact downloaded");
                    Ok(())
                }
                Err(e) => {
                    remove_quietly(&part).await;
                    Err(DownloadError::IoFailure(format!(
                        "failed to move artifact into place at {}: {e}",
                        target.display()
                    )))
                }
            },
            Err(err) => {
                remove_quietly(&part).await;
                warn!(url = %descriptor.source_url, error = %err, "model artifact download failed");
                Err(err)
            }
        }
    }
}

/// Stream a response body into `part`, hashing as bytes arrive.
///
/// Validates the advertised Content-Length and, when present, the expected
/// SHA-256 digest. Returns the number of bytes written.
async fn stream_body(
    response: reqwest::Response,
    part: &Path,
    expected_sha256: Option<&str>,
) -> Result<u64, DownloadError> {
    let expected_len = response.content_length();

    let mut file = tokio::fs::File::create(part).await.map_err(|e| {
        DownloadError::IoFailure(format!("failed to create {}: {e}", part.display()))
    })?;

    let mut hasher = Sha256::new();
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_request_error)?;
        hasher.update(&chunk);
        written += chunk.len() as u64;
        file.write_all(&chunk).await.map_err(|e| {
            DownloadError::IoFailure(format!("failed to write {}: {e}", part.display()))
        })?;
    }

    file.flush().await.map_err(|e| {
        DownloadError::IoFailure(format!("failed to flush {}: {e}", part.display()))
    })?;
    drop(file);

    if let Some(expected) = expected_len {
        if written != expected {
            return Err(DownloadError::IoFailure(format!(
                "truncated body: received {written} of {expected} bytes"
            )));
        }
    }

    if let Some(expected) = expected_sha256 {
        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(DownloadError::ChecksumMismatch {
                expected: expected.to_ascii_lowercase(),
                actual,
            });
        }
    }

    Ok(written)
}

/// Sibling path the body streams into before the atomic rename.
///
/// Appends `.part` rather than replacing the extension so distinct artifact
/// names can never share a temporary file.
fn part_path(target: &Path) -> PathBuf {
    let mut os = target.as_os_str().to_os_string();
    os.push(".part");
    PathBuf::from(os)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "failed to remove partial download");
        }
    }
}

fn map_request_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        DownloadError::Timeout(err.to_string())
    } else {
        DownloadError::IoFailure(err.to_string())
    }
}

/// Detail message for a rejected download. 401/403 get the auth-specific
/// wording hosts surface to users; everything else falls back to the
/// canonical reason phrase.
fn status_detail(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "authentication failed; the token may be invalid or expired".to_string(),
        403 => "access forbidden; the model may require accepting a license".to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    }
}
