//! Image payload decoding
//!
//! Turns an untrusted base64 payload, raw or wrapped in a
//! `data:image/...;base64,` URI, into a decoded [`DynamicImage`]. Pure
//! functions with no side effects; callers decide where the CPU work runs
//! (the orchestrator moves it off the async runtime with `spawn_blocking`).

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use edgemind_kernel::error::DecodeError;
use image::DynamicImage;

/// Marker that makes a payload a data URI for our purposes
const DATA_URI_MARKER: &str = "data:image/";

/// Standard alphabet, padding-indifferent: mobile encoders disagree on
/// whether trailing `=` is emitted, both must decode.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Extract the base64 portion of a payload.
///
/// Payloads carrying the `data:image/` marker must split into exactly two
/// parts on comma; anything else is a malformed data URI. Payloads without
/// the marker pass through untouched.
fn payload_body(payload: &str) -> Result<&str, DecodeError> {
    if !payload.starts_with(DATA_URI_MARKER) {
        return Ok(payload);
    }
    let parts: Vec<&str> = payload.split(',').collect();
    if parts.len() != 2 {
        return Err(DecodeError::InvalidDataUri(format!(
            "expected exactly 2 comma-separated parts, found {}",
            parts.len()
        )));
    }
    Ok(parts[1])
}

/// Decode the base64 portion of a payload to raw bytes.
///
/// ASCII whitespace is stripped first; some hosts wrap long payloads in
/// newlines.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let body = payload_body(payload)?;
    let cleaned: Vec<u8> = body
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    PAYLOAD_ENGINE
        .decode(&cleaned)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

/// Decode a base64 image payload into an in-memory image.
///
/// # Errors
/// - `InvalidDataUri`: data-URI wrapper did not split into exactly two parts
/// - `InvalidBase64`: payload text is not decodable base64
/// - `UnsupportedFormat`: decoded bytes are not a parseable image
pub fn decode_base64_image(payload: &str) -> Result<DynamicImage, DecodeError> {
    let bytes = decode_payload(payload)?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::UnsupportedFormat(
            "image has zero width or height".to_string(),
        ));
    }
    Ok(image)
}
