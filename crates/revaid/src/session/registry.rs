//! Session registry bridging the in-memory cache and the durable store.
//!
//! The registry is responsible for:
//! - Handing out per-session handles for serialized turn processing
//! - Restoring sessions from their latest snapshot on a cache miss
//! - Persisting snapshots and turn records after each turn
//! - Evicting inactive sessions once they exceed the TTL

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::store::SessionStore;

use super::snapshot::SessionSnapshot;
use super::state::Session;
use super::turns::TurnRecord;

// ============================================================================
// Session Registry
// ============================================================================

/// Registry of revision sessions.
///
/// Hot sessions live in memory behind per-session mutexes; everything else is
/// reachable through the durable store. Thread-safe and cheap to clone.
#[derive(Clone)]
pub struct SessionRegistry {
    /// Cached session handles by ID.
    cache: Arc<DashMap<String, Arc<Mutex<Session>>>>,
    /// Session store for persistence.
    store: Arc<dyn SessionStore>,
}

impl SessionRegistry {
    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Create a new session registry over the given store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            store,
        }
    }

    // ------------------------------------------------------------------------
    // Core API
    // ------------------------------------------------------------------------

    /// Register a new session and return its handle.
    ///
    /// The session is immediately visible to concurrent lookups. Durability
    /// is the caller's concern via [`SessionRegistry::persist`].
    pub fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let session_id = session.session_id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.cache.insert(session_id, handle.clone());
        handle
    }

    /// Get a session handle by ID.
    ///
    /// Falls back to the durable store on a cache miss and restores the
    /// latest snapshot into the cache. Returns `None` when the session is
    /// unknown or its snapshot cannot be read.
    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        if let Some(handle) = self.cache.get(session_id) {
            return Some(handle.clone());
        }

        let snapshot = match self.store.load_snapshot(session_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to load session snapshot"
                );
                return None;
            }
        };

        debug!(session_id = %session_id, "Restored session from snapshot");

        // A concurrent restore may have won the race; keep whichever entry
        // landed first so both callers share one handle.
        let handle = self
            .cache
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(snapshot.into_session())))
            .clone();
        Some(handle)
    }

    /// Persist a snapshot of the session's current state.
    ///
    /// Storage failures are logged and swallowed; the in-memory session
    /// stays authoritative for the rest of its lifetime in the cache.
    pub async fn persist(&self, session: &Session) {
        let snapshot = SessionSnapshot::from_session(session);
        if let Err(e) = self
            .store
            .save_snapshot(&session.session_id, &snapshot)
            .await
        {
            warn!(
                session_id = %session.session_id,
                error = %e,
                "Failed to persist session snapshot"
            );
        }
    }

    /// Append one turn to the session's durable history.
    ///
    /// Storage failures are logged and swallowed, same as [`SessionRegistry::persist`].
    pub async fn append_turn(&self, session_id: &str, record: &TurnRecord) {
        if let Err(e) = self
            .store
            .append_turns(session_id, std::slice::from_ref(record))
            .await
        {
            warn!(
                session_id = %session_id,
                error = %e,
                "Failed to append turn record"
            );
        }
    }

    /// Remove a session from the cache and the durable store.
    ///
    /// Returns true if the session existed in either place.
    pub async fn remove(&self, session_id: &str) -> bool {
        let cached = self.cache.remove(session_id).is_some();
        let stored = matches!(self.store.load_snapshot(session_id).await, Ok(Some(_)));

        if let Err(e) = self.store.delete(session_id).await {
            warn!(
                session_id = %session_id,
                error = %e,
                "Failed to delete stored session"
            );
        }

        cached || stored
    }

    /// Number of sessions currently cached in memory.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Get a reference to the session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------------

    /// Snapshot every known session, newest first.
    ///
    /// Cached sessions are snapshotted in place so the listing reflects turns
    /// not yet flushed; sessions that only exist on disk are read from their
    /// stored snapshots.
    pub async fn snapshots(&self) -> Vec<SessionSnapshot> {
        // Collect handles first to avoid holding DashMap references across await
        let cached: Vec<(String, Arc<Mutex<Session>>)> = self
            .cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut snapshots = Vec::with_capacity(cached.len());
        let mut seen = HashSet::new();

        for (session_id, handle) in cached {
            let session = handle.lock().await;
            snapshots.push(SessionSnapshot::from_session(&session));
            seen.insert(session_id);
        }

        let stored_ids = match self.store.list().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to list stored sessions");
                Vec::new()
            }
        };

        for session_id in stored_ids {
            if seen.contains(&session_id) {
                continue;
            }
            match self.store.load_snapshot(&session_id).await {
                Ok(Some(snapshot)) => snapshots.push(snapshot),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to load session snapshot"
                    );
                }
            }
        }

        snapshots.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        snapshots
    }

    // ------------------------------------------------------------------------
    // TTL / Expiry
    // ------------------------------------------------------------------------

    /// Evict sessions inactive beyond the given TTL.
    ///
    /// Each evicted session is snapshotted first so a later lookup restores
    /// it from disk. Returns the number of sessions evicted.
    pub async fn expire_inactive(&self, ttl: Duration) -> usize {
        let now = Utc::now();

        // Collect handles first to avoid holding DashMap references across await
        let handles: Vec<(String, Arc<Mutex<Session>>)> = self
            .cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut expired_count = 0;

        for (session_id, handle) in handles {
            let session = handle.lock().await;
            let inactive = now - session.last_interaction;
            if inactive < ttl {
                continue;
            }

            self.persist(&session).await;
            drop(session);

            info!(
                session_id = %session_id,
                inactive_hours = inactive.num_hours(),
                "Evicting inactive session"
            );
            self.cache.remove(&session_id);
            expired_count += 1;
        }

        if expired_count > 0 {
            info!(expired = expired_count, "Session expiry sweep complete");
        }

        expired_count
    }
}

// ============================================================================
// Tests
// ============================================================================
