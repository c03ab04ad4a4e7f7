//! Raw HTTP transport for the Gemini generateContent API.
//!
//! Posts the full wire types verbatim, so fields the SDK-style surface
//! cannot express (notably `thoughtSignature` on function call parts)
//! survive the round trip. Authentication goes through the `key` query
//! parameter.

use crate::config::DEFAULT_GEMINI_BASE_URL;
use crate::models::gemini::{GenerateContentRequest, GenerateContentResponse};
use crate::providers::traits::{GeminiBackend, ProviderError};
use async_trait::async_trait;
use reqwest::Client;

/// Gemini client over plain HTTP with full payload fidelity.
pub struct GeminiHttpClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiHttpClient {
    /// Create a client with an API key and the default base URL.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_GEMINI_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL (used by tests and
    /// self-hosted gateways).
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
}

#[async_trait]
impl GeminiBackend for GeminiHttpClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(request)
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
