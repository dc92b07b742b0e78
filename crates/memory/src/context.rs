//! Conversation context store: the per-session transcript the model sees.
//!
//! Reads are windowed to the trailing `max_words` words; writes append a
//! `User:`/`Bot:` pair to the full stored transcript, which is never trimmed.

use std::sync::Arc;

use persona_core::error::MemoryError;
use persona_core::session::{ConversationContext, SessionBackend, SessionId};
use tracing::debug;

/// Default word window handed back by [`ContextStore::get`].
pub const DEFAULT_MAX_WORDS: usize = 1000;

/// Windowed access to session transcripts over a [`SessionBackend`].
#[derive(Clone)]
pub struct ContextStore {
    backend: Arc<dyn SessionBackend>,
    max_words: usize,
}

impl ContextStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self {
            backend,
            max_words: DEFAULT_MAX_WORDS,
        }
    }

    /// Set the read window. Must be non-zero.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words.max(1);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Prior conversation for `session`, at most `max_words` words.
    ///
    /// Empty when the session has no history.
    pub async fn get(&self, session: &SessionId) -> Result<String, MemoryError> {
        let Some(context) = self.backend.load(session).await? else {
            return Ok(String::new());
        };
        let words = context.word_count();
        if words > self.max_words {
            debug!(session = %session, words, max = self.max_words, "Truncating conversation context");
        }
        Ok(context.window(self.max_words))
    }

    /// Append one exchange to the session transcript and persist it.
    pub async fn save(
        &self,
        session: &SessionId,
        user_message: &str,
        bot_response: &str,
    ) -> Result<(), MemoryError> {
        let mut context = self
            .backend
            .load(session)
            .await?
            .unwrap_or_else(ConversationContext::new);
        context.append_turn(user_message, bot_response);
        self.backend.store(session, &context).await
    }

    /// The full stored transcript, unwindowed.
    pub async fn transcript(&self, session: &SessionId) -> Result<ConversationContext, MemoryError> {
        Ok(self.backend.load(session).await?.unwrap_or_default())
    }
}
