//! LLM provider implementations for persona.
//!
//! All providers implement the `persona_core::Provider` trait.

pub mod embeddings;
pub mod gemini;

pub use embeddings::EmbeddingClient;
pub use gemini::GeminiProvider;

use std::sync::Arc;

use persona_core::provider::Provider;

/// Build the configured provider.
pub fn build_from_config(config: &persona_config::AppConfig) -> Arc<dyn Provider> {
    let provider = match &config.model.api_url {
        Some(url) => GeminiProvider::with_base_url(url, config.api_key.clone()),
        None => GeminiProvider::new(config.api_key.clone()),
    };
    if !provider.has_api_key() {
        tracing::warn!("No Gemini API key configured; model calls will fail until GOOGLE_API_KEY is set");
    }
    Arc::new(provider)
}

/// Build the embedding client for the configured embedding model.
pub fn embedding_client(
    config: &persona_config::AppConfig,
    provider: Arc<dyn Provider>,
) -> EmbeddingClient {
    EmbeddingClient::new(provider, &config.model.embedding_model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_gemini_from_default_config() {
        let provider = build_from_config(&persona_config::AppConfig::default());
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn embedding_client_uses_configured_model() {
        let config = persona_config::AppConfig::default();
        let client = embedding_client(&config, build_from_config(&config));
        assert_eq!(client.model(), "models/embedding-001");
    }
}
