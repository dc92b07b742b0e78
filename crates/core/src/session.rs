//! Session and conversation-context domain types.
//!
//! A session is identified by an opaque token (the `session` cookie) and owns
//! one [`ConversationContext`]: an append-only transcript kept as a single
//! text blob.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MemoryError;

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The running transcript of one session.
///
/// Turns are rendered as `User: …` / `Bot: …` line pairs separated by `\n`.
/// The stored blob is never truncated; [`ConversationContext::window`] bounds
/// what is handed back to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext {
    transcript: String,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transcript(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.transcript
    }

    /// Append one exchange to the transcript.
    pub fn append_turn(&mut self, user_message: &str, bot_response: &str) {
        if !self.transcript.is_empty() {
            self.transcript.push('\n');
        }
        self.transcript.push_str("User: ");
        self.transcript.push_str(user_message);
        self.transcript.push_str("\nBot: ");
        self.transcript.push_str(bot_response);
    }

    /// Number of whitespace-separated words in the transcript.
    pub fn word_count(&self) -> usize {
        self.transcript.split_whitespace().count()
    }

    /// The transcript limited to its trailing `max_words` words.
    ///
    /// Within the limit the blob is returned verbatim; past it the oldest words
    /// are dropped and the survivors are re-joined with single spaces, so line
    /// breaks inside the window are not preserved.
    pub fn window(&self, max_words: usize) -> String {
        let words: Vec<&str> = self.transcript.split_whitespace().collect();
        if words.len() <= max_words {
            return self.transcript.clone();
        }
        words[words.len() - max_words..].join(" ")
    }
}

/// Storage for session transcripts.
///
/// Implementations: in-memory, file-per-session, SQLite.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// The backend name (e.g., "memory", "file", "sqlite").
    fn name(&self) -> &str;

    /// Load the stored transcript, `None` when the session has none yet.
    async fn load(
        &self,
        session: &SessionId,
    ) -> std::result::Result<Option<ConversationContext>, MemoryError>;

    /// Replace the stored transcript for a session.
    async fn store(
        &self,
        session: &SessionId,
        context: &ConversationContext,
    ) -> std::result::Result<(), MemoryError>;
}
