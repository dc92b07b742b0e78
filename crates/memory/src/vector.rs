//! In-process vector store.
//!
//! Pure-Rust cosine ranking over a small, fully loaded document set. Used for
//! local development (seeded from a JSON-lines file) and in tests in place of
//! the Atlas index.

use async_trait::async_trait;
use persona_core::error::MemoryError;
use persona_core::retrieval::{SimilarityDocument, VectorQuery, VectorStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// A document plus its embedding, as held by [`InMemoryVectorStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_data: Option<String>,
}

impl StoredDocument {
    fn to_result(&self, score: f64) -> SimilarityDocument {
        SimilarityDocument {
            resume_data: self.resume_data.clone(),
            github_data: self.github_data.clone(),
            linkedin_data: self.linkedin_data.clone(),
            score,
        }
    }
}

/// Vector store over an in-memory document list.
///
/// `index_name` and `vector_field` in queries are ignored; every document
/// carries exactly one embedding.
pub struct InMemoryVectorStore {
    documents: Vec<StoredDocument>,
}

impl InMemoryVectorStore {
    pub fn new(documents: Vec<StoredDocument>) -> Self {
        Self { documents }
    }

    /// Load documents from a JSON-lines file, skipping unparseable lines.
    pub fn from_jsonl(path: &Path) -> Result<Self, MemoryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MemoryError::Storage(format!("Failed to read seed file {}: {e}", path.display()))
        })?;

        let documents: Vec<StoredDocument> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StoredDocument>(line) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted seed document");
                    None
                }
            })
            .collect();

        debug!(path = %path.display(), count = documents.len(), "Vector seed loaded");
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Equality post-filter on the projected text fields; empty matches all.
fn matches_filter(
    doc: &SimilarityDocument,
    filter: &serde_json::Map<String, serde_json::Value>,
) -> bool {
    filter
        .iter()
        .all(|(key, expected)| doc.field(key).is_some_and(|v| expected.as_str() == Some(v)))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, query: &VectorQuery) -> Result<Vec<SimilarityDocument>, MemoryError> {
        let mut scored: Vec<SimilarityDocument> = self
            .documents
            .iter()
            .map(|doc| doc.to_result(cosine_similarity(&doc.embedding, &query.vector) as f64))
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        // Candidate pool first, then limit, then the post-filter.
        scored.truncate((query.num_candidates as usize).min(query.limit));
        scored.retain(|doc| matches_filter(doc, &query.filter));
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(embedding: Vec<f32>, resume: &str) -> StoredDocument {
        StoredDocument {
            embedding,
            resume_data: Some(resume.into()),
            github_data: None,
            linkedin_data: None,
        }
    }

    fn query(vector: Vec<f32>, limit: usize) -> VectorQuery {
        VectorQuery {
            vector,
            index_name: "vector_index".into(),
            vector_field: "embedding".into(),
            num_candidates: 49,
            limit,
            filter: serde_json::Map::new(),
        }
    }

    #[test]
    fn cosine_identical_vectors() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_and_degenerate() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn returns_top_k_in_descending_score() {
        let store = InMemoryVectorStore::new(vec![
            doc(vec![0.0, 1.0], "far"),
            doc(vec![1.0, 0.0], "exact"),
            doc(vec![1.0, 1.0], "near"),
            doc(vec![-1.0, 0.0], "opposite"),
        ]);

        let results = store.search(&query(vec![1.0, 0.0], 3)).await.unwrap();
        assert_eq!(results.len(), 3);
        let names: Vec<&str> = results.iter().filter_map(|d| d.resume_data.as_deref()).collect();
        assert_eq!(names, vec!["exact", "near", "far"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn filter_applies_after_limit() {
        let store = InMemoryVectorStore::new(vec![
            doc(vec![1.0, 0.0], "exact"),
            doc(vec![1.0, 1.0], "near"),
        ]);
        let mut q = query(vec![1.0, 0.0], 2);
        q.filter
            .insert("resume_data".into(), serde_json::Value::String("near".into()));

        let results = store.search(&q).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].resume_data.as_deref(), Some("near"));
    }

    #[test]
    fn loads_jsonl_and_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.jsonl");
        std::fs::write(
            &path,
            "{\"embedding\": [1.0, 0.0], \"resume_data\": \"{}\"}\nnot json\n\n",
        )
        .unwrap();
        let store = InMemoryVectorStore::from_jsonl(&path).unwrap();
        assert_eq!(store.len(), 1);
    }
}
