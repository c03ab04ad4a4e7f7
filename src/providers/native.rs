//! SDK-style transport for the Gemini generateContent API.
//!
//! Mirrors the narrower type surface of the official client libraries:
//! parts carry no `thoughtSignature` slot, and inline image payloads are
//! decoded from base64 before being re-encoded onto the wire (malformed
//! payloads are rejected up front instead of by the upstream).
//! Authentication goes through the `x-goog-api-key` header.

use crate::config::DEFAULT_GEMINI_BASE_URL;
use crate::models::gemini::{
    GeminiContent, GeminiFunctionCall, GeminiFunctionResponse, GeminiTool, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig,
};
use crate::providers::traits::{GeminiBackend, ProviderError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;

/// Gemini client shaped like the official SDK surface.
///
/// This path cannot express thought signatures; callers that need them
/// preserved should prefer the raw HTTP path and use this one as the
/// fallback.
pub struct NativeGeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

/// SDK-dialect request body. Deliberately narrower than the full wire
/// types: no `thoughtSignature` on parts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SdkRequest<'a> {
    contents: Vec<SdkContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SdkContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SdkContent<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    role: &'a str,
    parts: Vec<SdkPart<'a>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct SdkPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'a GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<&'a GeminiFunctionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<SdkBlob<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SdkBlob<'a> {
    mime_type: &'a str,
    data: String,
}

impl NativeGeminiClient {
    /// Create a client with an API key and the default base URL.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_GEMINI_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: Client::new(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Project a full-fidelity content onto the SDK surface.
    ///
    /// Thought signatures are dropped (no slot for them); inline image
    /// payloads must decode as base64 or the whole request is rejected.
    fn to_sdk_content(content: &GeminiContent) -> Result<SdkContent<'_>, ProviderError> {
        let mut parts = Vec::with_capacity(content.parts.len());
        for part in &content.parts {
            let inline_data = match &part.inline_data {
                Some(blob) => {
                    let bytes = BASE64.decode(&blob.data)?;
                    Some(SdkBlob {
                        mime_type: &blob.mime_type,
                        data: BASE64.encode(bytes),
                    })
                }
                None => None,
            };

            parts.push(SdkPart {
                text: part.text.as_deref(),
                function_call: part.function_call.as_ref(),
                function_response: part.function_response.as_ref(),
                inline_data,
            });
        }

        Ok(SdkContent {
            role: &content.role,
            parts,
        })
    }
}

#[async_trait]
impl GeminiBackend for NativeGeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let body = SdkRequest {
            contents: request
                .contents
                .iter()
                .map(Self::to_sdk_content)
                .collect::<Result<Vec<_>, _>>()?,
            tools: request.tools.as_ref(),
            system_instruction: request
                .system_instruction
                .as_ref()
                .map(Self::to_sdk_content)
                .transpose()?,
            generation_config: request.generation_config.as_ref(),
        };

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
