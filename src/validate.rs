use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PROMPT: &str = "Describe what you see.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid request: Content-Type must be application/json")]
    UnsupportedMediaType,

    #[error("Invalid request: body must be a JSON object")]
    MalformedBody,

    #[error("No image data provided")]
    MissingImage,

    #[error("Prompt is required")]
    MissingPrompt,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRequest {
    /// Base64 image, without any `data:` URL prefix.
    pub image_data: String,
    /// Trimmed, never empty.
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
struct RawCaptionRequest {
    #[serde(default)]
    image_data: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

/// `application/json` or any `application/*+json`, ignoring parameters.
pub fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.split_once('/') {
        Some(("application", subtype)) => subtype == "json" || subtype.ends_with("+json"),
        _ => false,
    }
}

pub fn validate(headers: &HeaderMap, body: &[u8]) -> Result<CaptionRequest, ValidationError> {
    if !is_json(headers) {
        return Err(ValidationError::UnsupportedMediaType);
    }

    let raw: RawCaptionRequest =
        serde_json::from_slice(body).map_err(|_| ValidationError::MalformedBody)?;

    let image_data = match raw.image_data {
        Some(data) if !data.is_empty() => data,
        _ => return Err(ValidationError::MissingImage),
    };

    let prompt = raw.prompt.as_deref().unwrap_or(DEFAULT_PROMPT).trim();
    if prompt.is_empty() {
        return Err(ValidationError::MissingPrompt);
    }

    Ok(CaptionRequest {
        image_data,
        prompt: prompt.to_string(),
    })
}
