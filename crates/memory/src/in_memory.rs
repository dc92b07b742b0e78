//! In-memory session backend: the default, and what tests run against.
//!
//! Transcripts live as long as the process does.

use async_trait::async_trait;
use persona_core::error::MemoryError;
use persona_core::session::{ConversationContext, SessionBackend, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stores session transcripts in a map.
pub struct InMemorySessionBackend {
    sessions: Arc<RwLock<HashMap<SessionId, ConversationContext>>>,
}

impl InMemorySessionBackend {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of sessions with a stored transcript.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for InMemorySessionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionBackend for InMemorySessionBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, session: &SessionId) -> Result<Option<ConversationContext>, MemoryError> {
        Ok(self.sessions.read().await.get(session).cloned())
    }

    async fn store(
        &self,
        session: &SessionId,
        context: &ConversationContext,
    ) -> Result<(), MemoryError> {
        self.sessions
            .write()
            .await
            .insert(session.clone(), context.clone());
        Ok(())
    }
}
