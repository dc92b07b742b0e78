//! Similarity search over a pluggable [`VectorStore`].

use std::sync::Arc;

use persona_core::error::MemoryError;
use persona_core::retrieval::{SimilarityDocument, VectorQuery, VectorStore};
use serde_json::{Map, Value};
use tracing::debug;

/// Default candidate pool for approximate nearest-neighbour search.
pub const DEFAULT_NUM_CANDIDATES: u32 = 49;

/// Shapes [`VectorQuery`]s and hands them to a store.
#[derive(Clone)]
pub struct SimilaritySearch {
    store: Arc<dyn VectorStore>,
    num_candidates: u32,
}

impl SimilaritySearch {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            num_candidates: DEFAULT_NUM_CANDIDATES,
        }
    }

    pub fn with_num_candidates(mut self, num_candidates: u32) -> Self {
        self.num_candidates = num_candidates;
        self
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Top `k` documents nearest to `vector`, highest score first.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        index_name: &str,
        vector_field: &str,
        k: usize,
        filter: Map<String, Value>,
    ) -> Result<Vec<SimilarityDocument>, MemoryError> {
        let query = VectorQuery {
            vector,
            index_name: index_name.to_string(),
            vector_field: vector_field.to_string(),
            num_candidates: self.num_candidates,
            limit: k,
            filter,
        };

        let mut documents = self.store.search(&query).await?;
        documents.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        documents.truncate(k);

        debug!(
            store = self.store.name(),
            index = index_name,
            k,
            returned = documents.len(),
            "Similarity search complete"
        );
        Ok(documents)
    }
}
