//! The canonical session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::ContentChunk;
use crate::topics::TopicLimits;

// ============================================================================
// Session
// ============================================================================

/// One revision session for a student+topic pair.
///
/// All fields exist from construction; optional state is `None` rather than
/// absent. Handlers receive a mutable borrow for the duration of one turn and
/// must not retain it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub topic: String,
    pub student_id: String,

    /// Continuation turns processed so far. Starts at 0; incremented exactly
    /// once per continuation call, before classification.
    pub conversation_count: u32,
    pub started_at: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,

    /// Monotonic: once true, no code path flips it back.
    pub is_complete: bool,
    /// Covered-concept labels in delivery order; consecutive duplicates are
    /// collapsed on insert.
    pub key_concepts_covered: Vec<String>,
    pub understanding_level: String,

    pub max_conversations: u32,
    pub completion_threshold: u32,

    /// Cursor into `concept_chunks`. Stays in bounds while chunks remain;
    /// exhaustion is signalled by [`Session::advance_chunk`] returning `None`
    /// rather than by an out-of-range index.
    pub current_chunk_index: usize,
    /// Full ordered chunk sequence seeded at session start.
    pub concept_chunks: Vec<ContentChunk>,

    /// Set while a mini-quiz awaits the student's answers.
    pub active_quiz: Option<QuizState>,
    /// Set after an engaging question, naming the concept it targets.
    pub awaiting_answer: Option<AwaitedAnswer>,
}

impl Session {
    /// Create a fresh session with the cursor and counter at zero.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        topic: impl Into<String>,
        student_id: impl Into<String>,
        limits: TopicLimits,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            topic: topic.into(),
            student_id: student_id.into(),
            conversation_count: 0,
            started_at: now,
            last_interaction: now,
            is_complete: false,
            key_concepts_covered: Vec::new(),
            understanding_level: "beginner".to_string(),
            max_conversations: limits.max_conversations,
            completion_threshold: limits.completion_threshold,
            current_chunk_index: 0,
            concept_chunks: Vec::new(),
            active_quiz: None,
            awaiting_answer: None,
        }
    }

    /// The chunk the cursor currently points at, if any.
    pub fn current_chunk(&self) -> Option<&ContentChunk> {
        self.concept_chunks.get(self.current_chunk_index)
    }

    /// Advance the cursor and return the newly current chunk.
    ///
    /// Returns `None` without moving when the sequence is exhausted, so the
    /// cursor never runs past the last chunk.
    pub fn advance_chunk(&mut self) -> Option<&ContentChunk> {
        let next = self.current_chunk_index + 1;
        if next < self.concept_chunks.len() {
            self.current_chunk_index = next;
            self.concept_chunks.get(next)
        } else {
            None
        }
    }

    /// Record a covered concept, collapsing consecutive duplicates.
    pub fn record_concept(&mut self, concept: &str) {
        if self.key_concepts_covered.last().map(String::as_str) != Some(concept) {
            self.key_concepts_covered.push(concept.to_string());
        }
    }

    /// Mark the session complete. The flag never reverts.
    pub fn mark_complete(&mut self) {
        self.is_complete = true;
    }
}

// ============================================================================
// Quiz / Answer Flags
// ============================================================================

/// An in-progress mini-quiz and the concepts it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizState {
    pub concepts: Vec<String>,
}

/// An engaging question whose answer is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitedAnswer {
    pub concept: String,
}

// ============================================================================
// Tests
// ============================================================================
