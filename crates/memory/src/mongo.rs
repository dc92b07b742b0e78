//! MongoDB Atlas vector store.
//!
//! Runs a `$vectorSearch` aggregation against a collection whose documents
//! hold an embedding plus the `resume_data` / `github_data` / `linkedin_data`
//! text fields.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::{Client, Collection};
use persona_core::error::MemoryError;
use persona_core::retrieval::{DOCUMENT_FIELDS, SimilarityDocument, VectorQuery, VectorStore};
use tracing::{debug, info};

/// Vector search backed by an Atlas collection.
pub struct MongoVectorStore {
    collection: Collection<Document>,
}

impl MongoVectorStore {
    /// Build a client for `uri` and bind to `db_name.collection`.
    ///
    /// The driver connects lazily; a bad URI fails here, an unreachable
    /// cluster fails on the first search.
    pub async fn connect(uri: &str, db_name: &str, collection: &str) -> Result<Self, MemoryError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to create MongoDB client: {e}")))?;
        info!(db = db_name, collection, "MongoDB vector store ready");
        Ok(Self::from_collection(
            client.database(db_name).collection::<Document>(collection),
        ))
    }

    pub fn from_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

/// The aggregation pipeline for `query`.
pub fn build_pipeline(query: &VectorQuery) -> Result<Vec<Document>, MemoryError> {
    let vector: Vec<f64> = query.vector.iter().map(|v| f64::from(*v)).collect();
    let filter = bson::to_document(&query.filter)
        .map_err(|e| MemoryError::QueryFailed(format!("Invalid search filter: {e}")))?;

    Ok(vec![
        doc! {
            "$vectorSearch": {
                "index": query.index_name.as_str(),
                "path": query.vector_field.as_str(),
                "queryVector": vector,
                "numCandidates": i64::from(query.num_candidates),
                "limit": query.limit as i64,
            }
        },
        doc! { "$match": filter },
        doc! {
            "$project": {
                "resume_data": 1,
                "github_data": 1,
                "linkedin_data": 1,
                "score": { "$meta": "vectorSearchScore" },
            }
        },
    ])
}

/// Read a projected result. Non-string text fields are dropped.
pub fn project_document(document: &Document) -> SimilarityDocument {
    let text = |name: &str| document.get_str(name).ok().map(str::to_string);
    let score = match document.get("score") {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    };

    SimilarityDocument {
        resume_data: text(DOCUMENT_FIELDS[0]),
        github_data: text(DOCUMENT_FIELDS[1]),
        linkedin_data: text(DOCUMENT_FIELDS[2]),
        score,
    }
}

#[async_trait]
impl VectorStore for MongoVectorStore {
    fn name(&self) -> &str {
        "mongodb"
    }

    async fn search(&self, query: &VectorQuery) -> Result<Vec<SimilarityDocument>, MemoryError> {
        let pipeline = build_pipeline(query)?;
        let cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("Vector search failed: {e}")))?;

        let raw: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("Reading search results failed: {e}")))?;

        debug!(results = raw.len(), index = %query.index_name, "Vector search returned");
        Ok(raw.iter().map(project_document).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> VectorQuery {
        VectorQuery {
            vector: vec![0.5, -0.25],
            index_name: "vector_index".into(),
            vector_field: "embedding".into(),
            num_candidates: 49,
            limit: 3,
            filter: serde_json::Map::new(),
        }
    }

    #[test]
    fn pipeline_has_search_match_and_project_stages() {
        let pipeline = build_pipeline(&query()).unwrap();
        assert_eq!(pipeline.len(), 3);

        let search = pipeline[0].get_document("$vectorSearch").unwrap();
        assert_eq!(search.get_str("index").unwrap(), "vector_index");
        assert_eq!(search.get_str("path").unwrap(), "embedding");
        assert_eq!(search.get_i64("numCandidates").unwrap(), 49);
        assert_eq!(search.get_i64("limit").unwrap(), 3);
        let vector = search.get_array("queryVector").unwrap();
        assert_eq!(vector, &vec![Bson::Double(0.5), Bson::Double(-0.25)]);

        assert!(pipeline[1].get_document("$match").unwrap().is_empty());

        let project = pipeline[2].get_document("$project").unwrap();
        let score = project.get_document("score").unwrap();
        assert_eq!(score.get_str("$meta").unwrap(), "vectorSearchScore");
        assert_eq!(project.get_i32("resume_data").unwrap(), 1);
    }

    #[test]
    fn filter_is_carried_into_match() {
        let mut q = query();
        q.filter
            .insert("source".into(), serde_json::Value::String("resume".into()));
        let pipeline = build_pipeline(&q).unwrap();
        let matched = pipeline[1].get_document("$match").unwrap();
        assert_eq!(matched.get_str("source").unwrap(), "resume");
    }

    #[test]
    fn projection_ignores_non_string_fields() {
        let raw = doc! {
            "_id": 7,
            "resume_data": "{\"name\": \"x\"}",
            "github_data": 42,
            "score": 0.83,
        };
        let doc = project_document(&raw);
        assert_eq!(doc.resume_data.as_deref(), Some("{\"name\": \"x\"}"));
        assert!(doc.github_data.is_none());
        assert!(doc.linkedin_data.is_none());
        assert!((doc.score - 0.83).abs() < f64::EPSILON);
    }

    #[test]
    fn projection_defaults_missing_score() {
        let doc = project_document(&doc! { "linkedin_data": "[]" });
        assert_eq!(doc.score, 0.0);
        assert_eq!(doc.linkedin_data.as_deref(), Some("[]"));
    }
}
