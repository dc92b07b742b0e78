//! File-based session backend: one JSON document per session.
//!
//! Storage location: `~/.persona/sessions/<session>.json` by default.
//! Each file holds the transcript plus the time it was last written, and is
//! human-inspectable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use persona_core::error::MemoryError;
use persona_core::session::{ConversationContext, SessionBackend, SessionId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// On-disk shape of a session file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    session: String,
    transcript: ConversationContext,
    updated_at: DateTime<Utc>,
}

/// A directory of per-session JSON files.
pub struct FileSessionBackend {
    dir: PathBuf,
}

impl FileSessionBackend {
    /// Use `dir` for session files. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(dir = %dir.display(), "File session backend ready");
        Self { dir }
    }

    /// Path of the file holding `session`.
    ///
    /// Session tokens come from clients. `[A-Za-z0-9-]` is kept as is and every
    /// other byte becomes `_xx` (hex), so distinct ids never share a file and
    /// the file stays inside `dir`.
    fn path_for(&self, session: &SessionId) -> PathBuf {
        let mut name = String::with_capacity(session.as_str().len());
        for byte in session.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{byte:02x}"));
            }
        }
        if name.is_empty() {
            name.push('_');
        }
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl SessionBackend for FileSessionBackend {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, session: &SessionId) -> Result<Option<ConversationContext>, MemoryError> {
        let path = self.path_for(session);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read session file {}: {e}",
                    path.display()
                )));
            }
        };

        match serde_json::from_str::<SessionFile>(&content) {
            Ok(file) => Ok(Some(file.transcript)),
            Err(e) => {
                // A corrupt file starts the session over rather than failing every request.
                warn!(path = %path.display(), error = %e, "Skipping corrupted session file");
                Ok(None)
            }
        }
    }

    async fn store(
        &self,
        session: &SessionId,
        context: &ConversationContext,
    ) -> Result<(), MemoryError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create session directory: {e}"))
        })?;

        let file = SessionFile {
            session: session.to_string(),
            transcript: context.clone(),
            updated_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize session: {e}")))?;

        let path = self.path_for(session);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write session file: {e}")))?;

        Ok(())
    }
}
