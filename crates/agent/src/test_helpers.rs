//! Shared test doubles for orchestrator tests.

use async_trait::async_trait;
use persona_core::error::{MemoryError, ProviderError};
use persona_core::provider::{
    EmbeddingRequest, EmbeddingResponse, GenerateRequest, GenerateResponse, Provider, Usage,
};
use persona_core::retrieval::{SimilarityDocument, VectorQuery, VectorStore};
use std::sync::Mutex;

/// A provider that replies with a fixed sequence of texts.
///
/// Each call to `generate` returns the next reply and records the prompt.
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Vec<String>,
    failure: Option<ProviderError>,
    embeddings: bool,
    prompts: Mutex<Vec<String>>,
    embed_calls: Mutex<usize>,
}

impl ScriptedProvider {
    /// Vector returned by every successful `embed` call.
    pub const EMBEDDING: [f32; 3] = [0.1, 0.2, 0.3];

    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: replies.into_iter().map(String::from).collect(),
            failure: None,
            embeddings: true,
            prompts: Mutex::new(Vec::new()),
            embed_calls: Mutex::new(0),
        }
    }

    /// A provider whose `generate` always fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(vec![])
        }
    }

    /// Make `embed` report missing credentials.
    pub fn without_embeddings(mut self) -> Self {
        self.embeddings = false;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn embed_calls(&self) -> usize {
        *self.embed_calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let mut prompts = self.prompts.lock().unwrap();
        let call = prompts.len();
        let Some(text) = self.replies.get(call) else {
            panic!(
                "ScriptedProvider: no more replies (call #{call}, have {})",
                self.replies.len()
            );
        };
        prompts.push(request.prompt);

        Ok(GenerateResponse {
            text: text.clone(),
            model: request.model,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        *self.embed_calls.lock().unwrap() += 1;
        if !self.embeddings {
            return Err(ProviderError::NotConfigured("no API key".into()));
        }
        Ok(EmbeddingResponse {
            embedding: Self::EMBEDDING.to_vec(),
            model: request.model,
        })
    }
}

/// A vector store that returns fixed documents and records each query.
pub struct RecordingStore {
    documents: Vec<SimilarityDocument>,
    queries: Mutex<Vec<VectorQuery>>,
}

impl RecordingStore {
    pub fn new(documents: Vec<SimilarityDocument>) -> Self {
        Self {
            documents,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<VectorQuery> {
        self.queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn search(&self, query: &VectorQuery) -> Result<Vec<SimilarityDocument>, MemoryError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.documents.iter().take(query.limit).cloned().collect())
    }
}

/// Build a search result.
pub fn doc(
    resume: Option<&str>,
    github: Option<&str>,
    linkedin: Option<&str>,
    score: f64,
) -> SimilarityDocument {
    SimilarityDocument {
        resume_data: resume.map(String::from),
        github_data: github.map(String::from),
        linkedin_data: linkedin.map(String::from),
        score,
    }
}
