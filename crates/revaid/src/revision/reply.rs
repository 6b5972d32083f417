//! Structured reply returned for every lifecycle operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, Stage};

/// The reply contract shared by session start, continuation, and completion.
///
/// `session_summary`, `next_suggested_action`, and `session_stats` are only
/// present on completion replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionReply {
    pub response: String,
    pub topic: String,
    pub session_id: String,
    pub conversation_count: u32,
    pub is_session_complete: bool,
    pub session_summary: Option<String>,
    pub sources: Vec<String>,
    pub current_stage: Stage,
    pub max_conversations: u32,
    pub completion_threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_suggested_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_stats: Option<SessionStats>,
    pub timestamp: DateTime<Utc>,
}

/// Summary statistics computed when a session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_turns: u32,
    pub concepts_covered: usize,
    pub duration_minutes: i64,
    /// Share of the planned material covered, capped at 100.
    pub completion_rate: f64,
}

impl SessionStats {
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        Self {
            total_turns: session.conversation_count,
            concepts_covered: session.key_concepts_covered.len(),
            duration_minutes: (Utc::now() - session.started_at).num_minutes(),
            completion_rate: completion_percentage(session).min(100.0),
        }
    }
}

/// Progress percentage used by both the progress check and completion stats.
///
/// Concept coverage when the session has chunks to cover, otherwise turn
/// count against the completion threshold. Uncapped; callers cap for
/// display where the contract demands it.
pub(crate) fn completion_percentage(session: &Session) -> f64 {
    let total = session.concept_chunks.len();
    if total > 0 {
        session.key_concepts_covered.len() as f64 / total as f64 * 100.0
    } else {
        f64::from(session.conversation_count) / f64::from(session.completion_threshold) * 100.0
    }
}
