//! Vector retrieval types: the contract with the nearest-neighbour store.
//!
//! The store does the ranking; this side only shapes the query and reads the
//! projected fields back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Names of the text fields projected from each matched document, in the
/// order their contents are fed to the prompt.
pub const DOCUMENT_FIELDS: [&str; 3] = ["resume_data", "github_data", "linkedin_data"];

/// A document returned by similarity search.
///
/// Each text field, when present, is expected to hold embedded JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityDocument {
    /// Resume-derived content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_data: Option<String>,

    /// Code-host-derived content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_data: Option<String>,

    /// Professional-network-derived content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_data: Option<String>,

    /// Relevance score assigned by the store
    #[serde(default)]
    pub score: f64,
}

impl SimilarityDocument {
    /// The present text fields as `(name, value)` pairs, in [`DOCUMENT_FIELDS`] order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            (DOCUMENT_FIELDS[0], self.resume_data.as_deref()),
            (DOCUMENT_FIELDS[1], self.github_data.as_deref()),
            (DOCUMENT_FIELDS[2], self.linkedin_data.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }

    /// Look up a text field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "resume_data" => self.resume_data.as_deref(),
            "github_data" => self.github_data.as_deref(),
            "linkedin_data" => self.linkedin_data.as_deref(),
            _ => None,
        }
    }
}

/// A nearest-neighbour query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorQuery {
    /// The query embedding
    pub vector: Vec<f32>,

    /// Name of the vector index to search
    pub index_name: String,

    /// Path of the embedding field inside stored documents
    pub vector_field: String,

    /// Candidate pool size considered by the approximate search
    pub num_candidates: u32,

    /// Maximum number of documents to return
    pub limit: usize,

    /// Post-filter applied to the candidates; empty matches everything
    #[serde(default)]
    pub filter: serde_json::Map<String, serde_json::Value>,
}

/// A store that can rank documents by vector similarity.
///
/// Implementations: MongoDB Atlas, in-memory cosine ranking.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The store name (e.g., "mongodb", "memory").
    fn name(&self) -> &str;

    /// Run a similarity query. Results are ordered by descending score.
    async fn search(
        &self,
        query: &VectorQuery,
    ) -> std::result::Result<Vec<SimilarityDocument>, MemoryError>;
}
