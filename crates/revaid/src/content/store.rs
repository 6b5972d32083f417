//! Content store trait and shared types.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ContentChunk
// ============================================================================

/// An atomic unit of topic material.
///
/// Immutable once fetched. `chunk_id` is stable across fetches and is what
/// turn responses cite as sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    pub chunk_id: String,
    pub topic: String,
    pub text: String,
}

// ============================================================================
// TopicSummary
// ============================================================================

/// One entry in the topic listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: String,
    pub chunk_count: usize,
    pub description: String,
}

impl TopicSummary {
    #[must_use]
    pub fn new(topic: impl Into<String>, chunk_count: usize) -> Self {
        Self {
            topic: topic.into(),
            chunk_count,
            description: format!("Study material with {chunk_count} content sections"),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur reading the content corpus.
#[derive(Debug, Error)]
pub enum ContentError {
    /// I/O error during file operations.
    #[error("I/O error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backend unreachable or refused the query.
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

impl ContentError {
    /// Create a file I/O error with path context.
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Create an unavailable-backend error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Convenience type alias for content results.
pub type ContentResult<T> = Result<T, ContentError>;

// ============================================================================
// ContentStore
// ============================================================================

/// Query interface over the topic corpus.
///
/// Implementations are fallible; the fail-open policy lives one layer up in
/// [`ContentCatalog`](super::ContentCatalog), not here.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Distinct topics with their chunk counts.
    async fn topics(&self) -> ContentResult<Vec<TopicSummary>>;

    /// Ordered chunks for a topic, truncated at `limit`.
    async fn chunks(&self, topic: &str, limit: usize) -> ContentResult<Vec<ContentChunk>>;

    /// The full ordered chunk sequence for a topic.
    ///
    /// This ordering is authoritative: it is what a session's chunk cursor
    /// indexes into.
    async fn all_chunks(&self, topic: &str) -> ContentResult<Vec<ContentChunk>>;

    /// Ranked text search scoped to a topic.
    ///
    /// When ranked search yields nothing, implementations fall back to a
    /// case-insensitive substring scan over the same scope before returning
    /// empty.
    async fn search(&self, topic: &str, query: &str, limit: usize)
    -> ContentResult<Vec<ContentChunk>>;
}
