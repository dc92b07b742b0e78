//! Session transcripts and vector retrieval for persona.

pub mod context;
pub mod file_backend;
pub mod in_memory;
pub mod search;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mongodb")]
pub mod mongo;

pub use context::ContextStore;
pub use file_backend::FileSessionBackend;
pub use in_memory::InMemorySessionBackend;
pub use search::SimilaritySearch;
pub use vector::{InMemoryVectorStore, StoredDocument, cosine_similarity};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionBackend;

#[cfg(feature = "mongodb")]
pub use mongo::MongoVectorStore;
