//! File-based session storage implementation.
//!
//! Stores turn logs as JSONL files and snapshots as YAML files.
//!
//! Directory structure:
//! ```text
//! {sessions_dir}/
//!   {session_id}/
//!     turns.jsonl        # Append-only turn log
//!     state.yaml         # Atomic snapshot
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::session::{SessionSnapshot, TurnRecord};
use crate::store::error::{StorageError, StorageResult};
use crate::store::session::SessionStore;

/// File-based implementation of `SessionStore`.
///
/// Sessions are stored in subdirectories of `sessions_dir`, each with its own
/// `turns.jsonl` (append-only turn log) and `state.yaml` (atomic snapshot).
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    sessions_dir: PathBuf,
}

impl FileSessionStore {
    /// Create a new file session store.
    ///
    /// The sessions directory will be created when the first session is stored.
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    /// Get the directory path for a session.
    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_dir.join(session_id)
    }

    /// Get the turn log file path for a session.
    fn turns_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join("turns.jsonl")
    }

    /// Get the snapshot file path for a session.
    fn snapshot_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join("state.yaml")
    }

    /// Ensure the session directory exists.
    async fn ensure_session_dir(&self, session_id: &str) -> StorageResult<()> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::file_io(&dir, e))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    // ========================================================================
    // Index / Lifecycle
    // ========================================================================

    async fn list(&self) -> StorageResult<Vec<String>> {
        let mut sessions = Vec::new();

        let mut entries = match fs::read_dir(&self.sessions_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&self.sessions_dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&self.sessions_dir, e))?
        {
            let path = entry.path();
            if path.is_dir() {
                // Only directories with a snapshot count as sessions
                if path.join("state.yaml").exists()
                    && let Some(name) = path.file_name()
                {
                    sessions.push(name.to_string_lossy().to_string());
                }
            }
        }

        Ok(sessions)
    }

    async fn delete(&self, session_id: &str) -> StorageResult<()> {
        let dir = self.session_dir(session_id);

        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::file_io(&dir, e)),
        }
    }

    // ========================================================================
    // Turn Log (append-only)
    // ========================================================================

    async fn load_turns(&self, session_id: &str) -> StorageResult<Vec<TurnRecord>> {
        let path = self.turns_path(session_id);

        let file = match File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut records = Vec::new();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| StorageError::file_io(&path, e))?
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Skip malformed lines (crash recovery)
            let Ok(record) = serde_json::from_str::<TurnRecord>(trimmed) else {
                continue;
            };

            records.push(record);
        }

        Ok(records)
    }

    async fn append_turns(&self, session_id: &str, records: &[TurnRecord]) -> StorageResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.ensure_session_dir(session_id).await?;
        let path = self.turns_path(session_id);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;

        let mut buffer = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| StorageError::serialization(e.to_string()))?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        file.write_all(buffer.as_bytes())
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;

        // fsync for durability
        file.sync_all()
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;

        Ok(())
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    async fn load_snapshot(&self, session_id: &str) -> StorageResult<Option<SessionSnapshot>> {
        let path = self.snapshot_path(session_id);

        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        let snapshot: SessionSnapshot = serde_yaml::from_str(&contents)
            .map_err(|e| StorageError::file_deserialization(&path, e.to_string()))?;

        if !snapshot.is_compatible() {
            return Err(StorageError::file_incompatible_schema(
                &path,
                SessionSnapshot::SCHEMA_VERSION,
                &snapshot.schema_version,
            ));
        }

        Ok(Some(snapshot))
    }

    async fn save_snapshot(
        &self,
        session_id: &str,
        snapshot: &SessionSnapshot,
    ) -> StorageResult<()> {
        self.ensure_session_dir(session_id).await?;

        let final_path = self.snapshot_path(session_id);
        let temp_path = self.session_dir(session_id).join("state.yaml.tmp");

        let yaml = serde_yaml::to_string(snapshot)
            .map_err(|e| StorageError::serialization(e.to_string()))?;

        // Write to temp file first
        fs::write(&temp_path, yaml.as_bytes())
            .await
            .map_err(|e| StorageError::file_io(&temp_path, e))?;

        // Atomic rename
        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| StorageError::file_io(&final_path, e))?;

        Ok(())
    }
}
