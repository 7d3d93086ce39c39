//! SQLite-backed transcript store.
//!
//! One row per (session_id, lesson_id) pair; the `messages` column holds the
//! whole transcript as JSON and is rewritten on every append. Absence of a row
//! is a normal state, not an error. Database work runs on the blocking pool
//! with a connection opened per call.

use crate::lock::KeyedLocks;
use crate::transcript::{SessionKey, Turn};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Transcript store keyed by (session_id, lesson_id).
#[derive(Clone)]
pub struct TranscriptStore {
    db_path: PathBuf,
    append_locks: Arc<KeyedLocks>,
}

impl TranscriptStore {
    /// Open (or create) the store at the given database path.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_id TEXT,
                lesson_id INTEGER NOT NULL,
                messages TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(session_id, lesson_id)
            );

            CREATE INDEX IF NOT EXISTS idx_chat_sessions_user_lesson
                ON chat_sessions(user_id, lesson_id);
            ",
        )?;

        Ok(Self {
            db_path: db_path.to_path_buf(),
            append_locks: Arc::new(KeyedLocks::new()),
        })
    }

    /// Load the stored transcript for a session key.
    ///
    /// Returns an empty sequence when no row exists.
    pub async fn load(&self, session_id: &str, lesson_id: i64) -> anyhow::Result<Vec<Turn>> {
        let db_path = self.db_path.clone();
        let session_id = session_id.to_string();

        tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Turn>> {
            let conn = Connection::open(&db_path)?;
            let messages: Option<String> = conn
                .query_row(
                    "SELECT messages FROM chat_sessions WHERE session_id = ?1 AND lesson_id = ?2",
                    params![session_id, lesson_id],
                    |row| row.get(0),
                )
                .optional()?;

            match messages {
                Some(json) if !json.is_empty() => {
                    serde_json::from_str(&json).context("Corrupt transcript blob")
                }
                _ => Ok(Vec::new()),
            }
        })
        .await?
    }

    /// Append one turn to the transcript for a session key.
    ///
    /// Creates the row on first append; otherwise reads the full stored
    /// sequence, appends, and writes the whole blob back. The per-key lock is
    /// held across the read-modify-write so concurrent appends for the same
    /// key cannot drop a turn.
    pub async fn append(
        &self,
        session_id: &str,
        lesson_id: i64,
        user_id: Option<&str>,
        turn: Turn,
    ) -> anyhow::Result<()> {
        let key = SessionKey::new(session_id, lesson_id);
        let _guard = self.append_locks.acquire(&key).await;

        let db_path = self.db_path.clone();
        let session_id = session_id.to_string();
        let user_id = user_id.map(str::to_string);

        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let conn = Connection::open(&db_path)?;

            let existing: Option<String> = conn
                .query_row(
                    "SELECT messages FROM chat_sessions WHERE session_id = ?1 AND lesson_id = ?2",
                    params![session_id, lesson_id],
                    |row| row.get(0),
                )
                .optional()?;

            let mut turns: Vec<Turn> = match existing {
                Some(json) if !json.is_empty() => {
                    serde_json::from_str(&json).context("Corrupt transcript blob")?
                }
                _ => Vec::new(),
            };
            turns.push(turn);

            let json = serde_json::to_string(&turns)?;
            let now = chrono::Utc::now().to_rfc3339();

            // user_id is set on first write and never changed afterwards
            conn.execute(
                r"
                INSERT INTO chat_sessions (session_id, user_id, lesson_id, messages, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                ON CONFLICT(session_id, lesson_id) DO UPDATE SET
                    messages = excluded.messages,
                    updated_at = excluded.updated_at
                ",
                params![session_id, user_id, lesson_id, json, now],
            )?;

            Ok(())
        })
        .await?
    }

    /// Number of stored transcripts (all session keys).
    pub async fn count(&self) -> anyhow::Result<usize> {
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let conn = Connection::open(&db_path)?;
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM chat_sessions", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await?
    }
}
