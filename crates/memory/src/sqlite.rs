//! SQLite session backend.
//!
//! One table keyed by session id:
//! - `sessions(id TEXT PRIMARY KEY, transcript TEXT, updated_at TEXT)`

use async_trait::async_trait;
use chrono::Utc;
use persona_core::error::MemoryError;
use persona_core::session::{ConversationContext, SessionBackend, SessionId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Session transcripts persisted in a SQLite database file.
pub struct SqliteSessionBackend {
    pool: SqlitePool,
}

impl SqliteSessionBackend {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let backend = Self { pool };
        backend.run_migrations().await?;
        info!("SQLite session backend initialized at {path}");
        Ok(backend)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id          TEXT PRIMARY KEY NOT NULL,
                transcript  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("sessions table: {e}")))?;

        debug!("SQLite session migrations complete");
        Ok(())
    }

    /// Number of stored sessions.
    pub async fn count(&self) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;
        Ok(n as usize)
    }
}

#[async_trait]
impl SessionBackend for SqliteSessionBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load(&self, session: &SessionId) -> Result<Option<ConversationContext>, MemoryError> {
        let row = sqlx::query("SELECT transcript FROM sessions WHERE id = ?1")
            .bind(session.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("load session: {e}")))?;

        row.map(|r| {
            r.try_get::<String, _>("transcript")
                .map(ConversationContext::from_transcript)
                .map_err(|e| MemoryError::QueryFailed(format!("decode transcript: {e}")))
        })
        .transpose()
    }

    async fn store(
        &self,
        session: &SessionId,
        context: &ConversationContext,
    ) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, transcript, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                transcript = excluded.transcript,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session.as_str())
        .bind(context.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("store session: {e}")))?;

        Ok(())
    }
}
