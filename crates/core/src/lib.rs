//! # Persona Core
//!
//! Domain types, traits, and error definitions for the persona chat backend.
//! This crate has **zero framework dependencies**: it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here:
//! - [`Provider`]: the hosted generative/embedding model
//! - [`SessionBackend`]: where per-session transcripts are kept
//! - [`VectorStore`]: the nearest-neighbour document index
//!
//! Implementations live in their respective crates, so the orchestrator can be
//! exercised end-to-end with scripted stand-ins.

pub mod error;
pub mod provider;
pub mod retrieval;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, GenerateRequest, GenerateResponse, Provider, TaskType,
};
pub use retrieval::{SimilarityDocument, VectorQuery, VectorStore};
pub use session::{ConversationContext, SessionBackend, SessionId};
