//! Chat orchestrator: one user message in, one formatted reply out.
//!
//! # Flow
//!
//! 1. Load the session's windowed conversation context
//! 2. Ask the model to classify the message
//! 3. Context-specific: embed the message, fetch the nearest documents and
//!    build a retrieval prompt from them; generic: build the deflection prompt
//! 4. Generate, format, persist the exchange, return the reply

use std::sync::Arc;

use persona_core::error::{Error, Result};
use persona_core::provider::{GenerateRequest, Provider};
use persona_core::retrieval::SimilarityDocument;
use persona_core::session::SessionId;
use persona_memory::{ContextStore, SimilaritySearch};
use persona_providers::EmbeddingClient;
use tracing::{debug, info, warn};

use crate::format::format_text;
use crate::intent::Intent;
use crate::prompts::Prompts;

/// Default generative model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Where and how many documents to retrieve for context-specific messages.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    pub index_name: String,
    pub vector_field: String,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            index_name: "vector_index".into(),
            vector_field: "embedding".into(),
            top_k: 3,
        }
    }
}

/// Result of handling one message.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// The formatted reply, as stored in the session transcript.
    pub response: String,
    /// Branch the classifier picked.
    pub intent: Intent,
    /// Number of documents retrieved (always 0 for generic messages).
    pub documents: usize,
}

/// Routes messages between retrieval-augmented and generic answers.
pub struct ChatOrchestrator {
    provider: Arc<dyn Provider>,
    embeddings: EmbeddingClient,
    search: SimilaritySearch,
    contexts: ContextStore,
    prompts: Prompts,
    model: String,
    temperature: Option<f32>,
    retrieval: RetrievalSettings,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        embeddings: EmbeddingClient,
        search: SimilaritySearch,
        contexts: ContextStore,
    ) -> Self {
        Self {
            provider,
            embeddings,
            search,
            contexts,
            prompts: Prompts::default(),
            model: DEFAULT_MODEL.into(),
            temperature: None,
            retrieval: RetrievalSettings::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalSettings) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    /// Handle a message and return only the reply text.
    pub async fn handle(&self, message: &str, session: &SessionId) -> Result<String> {
        Ok(self.respond(message, session).await?.response)
    }

    /// Handle a message, reporting the branch taken alongside the reply.
    pub async fn respond(&self, message: &str, session: &SessionId) -> Result<ChatOutcome> {
        if message.trim().is_empty() {
            return Err(Error::Validation("message must not be empty".into()));
        }

        let context = self.contexts.get(session).await?;

        let label = self.generate(self.prompts.classifier(message)).await?;
        let intent = Intent::from_label(&label);
        info!(session = %session, %intent, "Message classified");

        let (prompt, documents) = match intent {
            Intent::ContextSpecific => {
                let documents = self.retrieve(message).await?;
                let combined = combine_documents(&documents);
                (
                    self.prompts.retrieval(&context, &combined, message),
                    documents.len(),
                )
            }
            Intent::Generic => (self.prompts.generic(message), 0),
        };
        debug!(prompt_chars = prompt.len(), context_chars = context.len(), "Prompt assembled");

        let reply = self.generate(prompt).await?;
        let response = format_text(&reply);

        self.contexts.save(session, message, &response).await?;

        info!(
            session = %session,
            %intent,
            documents,
            response_len = response.len(),
            "Chat response generated"
        );

        Ok(ChatOutcome {
            response,
            intent,
            documents,
        })
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let mut request = GenerateRequest::new(&self.model, prompt);
        request.temperature = self.temperature;
        let response = self.provider.generate(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Generation complete"
            );
        }
        Ok(response.text)
    }

    async fn retrieve(&self, message: &str) -> Result<Vec<SimilarityDocument>> {
        let vector = self.embeddings.embed(message).await?;
        let documents = self
            .search
            .query(
                vector,
                &self.retrieval.index_name,
                &self.retrieval.vector_field,
                self.retrieval.top_k,
                serde_json::Map::new(),
            )
            .await?;
        debug!(documents = documents.len(), "Documents retrieved");
        Ok(documents)
    }
}

/// Pretty-print every parseable text field of `documents`, one block per
/// field, joined by newlines. Fields that are not valid JSON are skipped.
pub fn combine_documents(documents: &[SimilarityDocument]) -> String {
    let mut blocks = Vec::new();
    for doc in documents {
        for (name, text) in doc.fields() {
            let parsed = serde_json::from_str::<serde_json::Value>(text)
                .and_then(|value| serde_json::to_string_pretty(&value));
            match parsed {
                Ok(block) => blocks.push(block),
                Err(e) => warn!(field = name, error = %e, "Skipping unparseable document field"),
            }
        }
    }
    blocks.join("\n")
}
