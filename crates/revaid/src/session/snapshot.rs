//! Session snapshot schema for durable restore.
//!
//! Snapshots are written as YAML files holding the complete session state at
//! a point in time. They are the source of truth on process restart; the
//! in-memory cache is a performance overlay rebuilt from them lazily.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::ContentChunk;
use crate::topics::{DEFAULT_COMPLETION_THRESHOLD, DEFAULT_MAX_CONVERSATIONS};

use super::state::{AwaitedAnswer, QuizState, Session};

/// A durable snapshot of session state.
///
/// Progress fields default when absent so older or hand-trimmed snapshots
/// still restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Schema version for forward compatibility.
    pub schema_version: String,
    pub session_id: String,
    pub topic: String,
    pub student_id: String,
    /// When this snapshot was taken.
    pub snapshot_at: DateTime<Utc>,

    pub started_at: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
    #[serde(default)]
    pub conversation_count: u32,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub key_concepts_covered: Vec<String>,
    #[serde(default = "default_understanding_level")]
    pub understanding_level: String,
    #[serde(default = "default_max_conversations")]
    pub max_conversations: u32,
    #[serde(default = "default_completion_threshold")]
    pub completion_threshold: u32,
    #[serde(default)]
    pub current_chunk_index: usize,
    #[serde(default)]
    pub concept_chunks: Vec<ContentChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_quiz: Option<QuizState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting_answer: Option<AwaitedAnswer>,
}

fn default_understanding_level() -> String {
    "beginner".to_string()
}

fn default_max_conversations() -> u32 {
    DEFAULT_MAX_CONVERSATIONS
}

fn default_completion_threshold() -> u32 {
    DEFAULT_COMPLETION_THRESHOLD
}

impl SessionSnapshot {
    /// Current schema version.
    pub const SCHEMA_VERSION: &'static str = "1";

    /// Snapshot the given session as of now.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION.to_string(),
            session_id: session.session_id.clone(),
            topic: session.topic.clone(),
            student_id: session.student_id.clone(),
            snapshot_at: Utc::now(),
            started_at: session.started_at,
            last_interaction: session.last_interaction,
            conversation_count: session.conversation_count,
            is_complete: session.is_complete,
            key_concepts_covered: session.key_concepts_covered.clone(),
            understanding_level: session.understanding_level.clone(),
            max_conversations: session.max_conversations,
            completion_threshold: session.completion_threshold,
            current_chunk_index: session.current_chunk_index,
            concept_chunks: session.concept_chunks.clone(),
            active_quiz: session.active_quiz.clone(),
            awaiting_answer: session.awaiting_answer.clone(),
        }
    }

    /// Rebuild the in-memory session this snapshot was taken from.
    #[must_use]
    pub fn into_session(self) -> Session {
        Session {
            session_id: self.session_id,
            topic: self.topic,
            student_id: self.student_id,
            conversation_count: self.conversation_count,
            started_at: self.started_at,
            last_interaction: self.last_interaction,
            is_complete: self.is_complete,
            key_concepts_covered: self.key_concepts_covered,
            understanding_level: self.understanding_level,
            max_conversations: self.max_conversations,
            completion_threshold: self.completion_threshold,
            current_chunk_index: self.current_chunk_index,
            concept_chunks: self.concept_chunks,
            active_quiz: self.active_quiz,
            awaiting_answer: self.awaiting_answer,
        }
    }

    /// Check if this snapshot is compatible with the current schema.
    pub fn is_compatible(&self) -> bool {
        self.schema_version == Self::SCHEMA_VERSION
    }
}
