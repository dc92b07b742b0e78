//! Google Gemini provider implementation.
//!
//! Talks to the Generative Language REST API:
//! - `models/{model}:generateContent` for classification and answers
//! - `models/{model}:embedContent` for query embeddings
//!
//! Authentication is an API key sent in the `x-goog-api-key` header, never in
//! the URL, so transport errors can be surfaced without leaking it.

use async_trait::async_trait;
use persona_core::error::ProviderError;
use persona_core::provider::*;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Fallback wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Default Generative Language API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini LLM provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider against the public endpoint.
    ///
    /// A missing key is not an error here; calls fail with
    /// [`ProviderError::NotConfigured`] instead.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a provider against a custom API root (proxies, test servers).
    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "Gemini API key not found. Set GOOGLE_API_KEY or api_key in config.".into(),
            )
        })
    }

    /// Gemini addresses models as `models/{name}`; accept either spelling.
    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, Self::model_path(model), method)
    }

    /// Transport failure, stripped of the request URL.
    fn network_error(e: reqwest::Error) -> ProviderError {
        ProviderError::Network(e.without_url().to_string())
    }

    /// Seconds from a delta-seconds `Retry-After`; HTTP dates fall back to the default.
    fn retry_after_secs(headers: &HeaderMap) -> u64 {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
    }

    /// Map non-success statuses to provider errors.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: Self::retry_after_secs(response.headers()),
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            // Gemini reports a rejected key as 400 INVALID_ARGUMENT.
            if error_body.contains("API_KEY_INVALID") {
                return Err(ProviderError::AuthenticationFailed(error_body));
            }
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, ProviderError> {
        let api_key = self.api_key()?;
        let url = self.endpoint(&request.model, "generateContent");

        let body = GenerateContentRequest {
            contents: vec![Content::text(&request.prompt)],
            generation_config: GenerationConfig::from_request(&request),
        };

        debug!(model = %request.model, prompt_len = request.prompt.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::network_error)?;

        let response = Self::check_status(response).await?;

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let text = api_response.text().ok_or_else(|| {
            ProviderError::MalformedResponse("No candidates in response".into())
        })?;

        let usage = api_response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(GenerateResponse {
            text,
            model: api_response.model_version.unwrap_or(request.model),
            usage,
        })
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        let api_key = self.api_key()?;
        let url = self.endpoint(&request.model, "embedContent");

        let body = EmbedContentRequest {
            model: Self::model_path(&request.model),
            content: Content::text(&request.content),
            task_type: request.task_type,
        };

        debug!(model = %request.model, content_len = request.content.len(), "Sending embedContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::network_error)?;

        let response = Self::check_status(response).await?;

        let api_response: EmbedContentResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        let embedding = api_response
            .embedding
            .map(|e| e.values)
            .ok_or_else(|| ProviderError::MalformedResponse("Embeddings not found".into()))?;

        Ok(EmbeddingResponse {
            embedding,
            model: request.model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(Self::network_error)?;

        Ok(response.status().is_success())
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

impl Content {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

impl GenerationConfig {
    fn from_request(request: &GenerateRequest) -> Option<Self> {
        request.temperature.map(|temperature| Self { temperature })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, its parts concatenated.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let parts = &candidate.content.as_ref()?.parts;
        Some(parts.iter().filter_map(|p| p.text.as_deref()).collect())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

// --- Embedding API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: TaskType,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    #[serde(default)]
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}
