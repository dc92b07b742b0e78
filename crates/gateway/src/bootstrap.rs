//! Wiring: turn an [`AppConfig`] into a ready [`ChatOrchestrator`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use persona_agent::{ChatOrchestrator, Prompts, RetrievalSettings};
use persona_config::AppConfig;
use persona_core::error::{Error, Result};
use persona_core::provider::Provider;
use persona_core::retrieval::VectorStore;
use persona_core::session::SessionBackend;
use persona_memory::{
    ContextStore, FileSessionBackend, InMemorySessionBackend, InMemoryVectorStore,
    MongoVectorStore, SimilaritySearch, SqliteSessionBackend,
};
use tracing::{info, warn};

fn config_error(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
    }
}

/// Build every collaborator named by `config` and assemble the orchestrator.
pub async fn build_orchestrator(config: &AppConfig) -> Result<ChatOrchestrator> {
    let provider = persona_providers::build_from_config(config);
    let sessions = session_backend(config).await?;
    let store = vector_store(config).await?;
    Ok(assemble(config, provider, sessions, store))
}

/// Assemble the orchestrator from already-built parts.
pub fn assemble(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    sessions: Arc<dyn SessionBackend>,
    store: Arc<dyn VectorStore>,
) -> ChatOrchestrator {
    let embeddings = persona_providers::embedding_client(config, provider.clone());
    let search = SimilaritySearch::new(store).with_num_candidates(config.retrieval.num_candidates);
    let contexts = ContextStore::new(sessions).with_max_words(config.session.max_context_words);

    info!(
        model = %config.model.chat_model,
        sessions = contexts.backend_name(),
        vectors = search.store_name(),
        owner = %config.persona.owner_name,
        "Chat orchestrator assembled"
    );

    ChatOrchestrator::new(provider, embeddings, search, contexts)
        .with_prompts(Prompts::new(&config.persona.owner_name))
        .with_model(&config.model.chat_model)
        .with_temperature(config.model.temperature)
        .with_retrieval(RetrievalSettings {
            index_name: config.mongo.index_name().to_string(),
            vector_field: config.mongo.embedding_field().to_string(),
            top_k: config.retrieval.top_k,
        })
}

/// The session backend selected by `session.backend`.
pub async fn session_backend(config: &AppConfig) -> Result<Arc<dyn SessionBackend>> {
    match config.session.backend.as_str() {
        "memory" => Ok(Arc::new(InMemorySessionBackend::new())),
        "file" => {
            let dir = config
                .session
                .path
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(AppConfig::sessions_dir);
            Ok(Arc::new(FileSessionBackend::new(dir)))
        }
        "sqlite" => {
            let path = config
                .session
                .path
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| AppConfig::config_dir().join("sessions.db"));
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    config_error(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
            let url = format!("sqlite://{}", path.display());
            Ok(Arc::new(SqliteSessionBackend::new(&url).await?))
        }
        other => Err(config_error(format!("unknown session backend '{other}'"))),
    }
}

/// The vector store selected by `vector_store.backend`.
pub async fn vector_store(config: &AppConfig) -> Result<Arc<dyn VectorStore>> {
    match config.vector_store.backend.as_str() {
        "memory" => match &config.vector_store.seed_path {
            Some(path) => Ok(Arc::new(InMemoryVectorStore::from_jsonl(Path::new(path))?)),
            None => {
                warn!("In-memory vector store has no seed file; retrieval will find nothing");
                Ok(Arc::new(InMemoryVectorStore::new(Vec::new())))
            }
        },
        "mongodb" => {
            let mongo = &config.mongo;
            let uri = mongo
                .connection_uri()
                .map_err(|e| config_error(e.to_string()))?;
            let db = mongo
                .db_name
                .as_deref()
                .ok_or_else(|| config_error("mongo.db_name (MONGO_DB_NAME) is not set"))?;
            let collection = mongo
                .collection
                .as_deref()
                .ok_or_else(|| config_error("mongo.collection (MONGO_CL_NAME) is not set"))?;
            Ok(Arc::new(MongoVectorStore::connect(&uri, db, collection).await?))
        }
        other => Err(config_error(format!("unknown vector store backend '{other}'"))),
    }
}
