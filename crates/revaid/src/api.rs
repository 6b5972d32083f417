//! Shared API types for the HTTP surface.
//!
//! These types define the request/response contract of the session and topic
//! endpoints. The lifecycle reply itself is
//! [`RevisionReply`](crate::revision::RevisionReply), returned verbatim by
//! the start and continuation endpoints.

use serde::{Deserialize, Serialize};

use crate::content::TopicSummary;
use crate::session::{Session, SessionSnapshot, TurnRecord};

// ============================================================================
// Session Requests
// ============================================================================

/// Request to start a revision session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub topic: String,
    pub student_id: String,
    /// Caller-chosen session id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Request to continue a session with one student utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueSessionRequest {
    pub message: String,
}

// ============================================================================
// Session Views
// ============================================================================

/// Summary of a session in list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub topic: String,
    pub student_id: String,
    pub conversation_count: u32,
    pub is_complete: bool,
    pub started_at: String,
    pub last_interaction: String,
}

impl SessionSummary {
    #[must_use]
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id.clone(),
            topic: snapshot.topic.clone(),
            student_id: snapshot.student_id.clone(),
            conversation_count: snapshot.conversation_count,
            is_complete: snapshot.is_complete,
            started_at: snapshot.started_at.to_rfc3339(),
            last_interaction: snapshot.last_interaction.to_rfc3339(),
        }
    }
}

/// Response for listing sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Progress view of a single session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProgressResponse {
    pub session_id: String,
    pub topic: String,
    pub student_id: String,
    pub conversation_count: u32,
    pub max_conversations: u32,
    pub completion_threshold: u32,
    pub is_complete: bool,
    /// Share of the planned material covered, capped at 100.
    pub completion_percentage: f64,
    pub key_concepts_covered: Vec<String>,
    pub understanding_level: String,
    pub total_chunks: usize,
    pub started_at: String,
    pub last_interaction: String,
}

impl SessionProgressResponse {
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            topic: session.topic.clone(),
            student_id: session.student_id.clone(),
            conversation_count: session.conversation_count,
            max_conversations: session.max_conversations,
            completion_threshold: session.completion_threshold,
            is_complete: session.is_complete,
            completion_percentage: crate::revision::completion_percentage(session).min(100.0),
            key_concepts_covered: session.key_concepts_covered.clone(),
            understanding_level: session.understanding_level.clone(),
            total_chunks: session.concept_chunks.len(),
            started_at: session.started_at.to_rfc3339(),
            last_interaction: session.last_interaction.to_rfc3339(),
        }
    }
}

// ============================================================================
// Turn Log
// ============================================================================

/// Response for reading a session's durable turn log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTurnsResponse {
    pub turns: Vec<TurnRecord>,
}

// ============================================================================
// Topics
// ============================================================================

/// Response for listing revision topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTopicsResponse {
    pub topics: Vec<TopicSummary>,
}

// ============================================================================
// Tests
// ============================================================================
