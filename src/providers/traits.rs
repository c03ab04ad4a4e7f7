//! Backend trait and error types shared by the Gemini transport paths.

use crate::models::gemini::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a Gemini backend call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream returned a non-success status.
    #[error("gemini API error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure (connect, timeout, body read).
    #[error("gemini request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Inline image payload is not valid base64.
    #[error("invalid base64 image data: {0}")]
    InvalidImageData(#[from] base64::DecodeError),
}

/// A backend able to serve a generateContent call.
///
/// Implementations differ in what they preserve on the wire; callers
/// pick a path per request and fall back to the lossier one when the
/// richer path is unavailable.
#[async_trait]
pub trait GeminiBackend: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError>;
}
