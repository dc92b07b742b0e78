//! Embedding client: turns a chat message into a query vector.
//!
//! Missing or rejected credentials and malformed responses degrade to an empty
//! vector (logged), so a misconfigured embedding model never takes the chat
//! down on its own. Transport and API failures still propagate.

use std::sync::Arc;

use persona_core::error::ProviderError;
use persona_core::provider::{EmbeddingRequest, Provider, TaskType};
use tracing::{debug, warn};

/// Wraps a [`Provider`] with a fixed embedding model; requests are tagged
/// `RETRIEVAL_DOCUMENT`.
pub struct EmbeddingClient {
    provider: Arc<dyn Provider>,
    model: String,
    task_type: TaskType,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            task_type: TaskType::RetrievalDocument,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed one piece of text. One upstream call, no caching, no retry.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            content: text.to_string(),
            task_type: self.task_type,
        };

        match self.provider.embed(request).await {
            Ok(response) => {
                debug!(model = %self.model, dims = response.embedding.len(), "Embedding generated");
                Ok(response.embedding)
            }
            Err(
                e @ (ProviderError::NotConfigured(_)
                | ProviderError::AuthenticationFailed(_)
                | ProviderError::MalformedResponse(_)),
            ) => {
                warn!(provider = %self.provider.name(), error = %e, "Embedding unavailable, continuing with empty vector");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
