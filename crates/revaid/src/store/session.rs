//! Session storage trait.
//!
//! Defines the interface for persisting session snapshots and turn logs.

use async_trait::async_trait;

use crate::session::{SessionSnapshot, TurnRecord};

use super::error::StorageResult;

/// Storage interface for session persistence.
///
/// Combines a latest-state snapshot store with an append-only turn log.
#[async_trait]
pub trait SessionStore: Send + Sync {
    // ========================================================================
    // Index / Lifecycle
    // ========================================================================

    /// List all session IDs with durable state.
    async fn list(&self) -> StorageResult<Vec<String>>;

    /// Delete a session and all its data.
    ///
    /// Removes both the turn log and snapshot. Deleting a session that does
    /// not exist is not an error.
    async fn delete(&self, session_id: &str) -> StorageResult<()>;

    // ========================================================================
    // Turn Log (append-only)
    // ========================================================================

    /// Load the full turn history for a session, oldest first.
    async fn load_turns(&self, session_id: &str) -> StorageResult<Vec<TurnRecord>>;

    /// Append records to the session's turn log.
    ///
    /// Records must be persisted durably before returning.
    async fn append_turns(&self, session_id: &str, records: &[TurnRecord]) -> StorageResult<()>;

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Load the latest snapshot for a session.
    ///
    /// Returns `Ok(None)` if no snapshot exists yet.
    async fn load_snapshot(&self, session_id: &str) -> StorageResult<Option<SessionSnapshot>>;

    /// Save a snapshot for a session.
    ///
    /// Must be atomic - either fully succeeds or has no effect.
    async fn save_snapshot(
        &self,
        session_id: &str,
        snapshot: &SessionSnapshot,
    ) -> StorageResult<()>;
}
