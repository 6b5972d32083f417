//! Pedagogical stage labels and the turn classifier.
//!
//! Classification is an ordered rule table: the first predicate that holds
//! wins, so table order encodes priority. A question always interrupts
//! scheduled drilling, and the numeric triggers deliberately overlap (turn 15
//! matches both the quiz and question rules) with list order as the hard
//! tie-break.

use serde::{Deserialize, Serialize};

use super::state::Session;

// ============================================================================
// Stage
// ============================================================================

/// The closed set of pedagogical stages a turn can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    KickoffResponse,
    ProgressiveRecap,
    EngagingQuestion,
    MiniQuiz,
    QuizFeedback,
    UserQuestion,
    ProgressCheck,
    General,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::KickoffResponse => "kickoff_response",
            Stage::ProgressiveRecap => "progressive_recap",
            Stage::EngagingQuestion => "engaging_question",
            Stage::MiniQuiz => "mini_quiz",
            Stage::QuizFeedback => "quiz_feedback",
            Stage::UserQuestion => "user_question",
            Stage::ProgressCheck => "progress_check",
            Stage::General => "general",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Tokens whose presence (case-insensitive substring) marks an utterance as
/// a student question.
const QUESTION_TOKENS: &[&str] = &[
    "what", "why", "how", "when", "where", "which", "who", "can you", "could you", "explain", "?",
];

type StagePredicate = fn(&Session, &str) -> bool;

/// Ordered rule table; first match wins. The final entry is a catch-all.
const STAGE_RULES: &[(StagePredicate, Stage)] = &[
    (is_first_turn, Stage::KickoffResponse),
    (is_question, Stage::UserQuestion),
    (quiz_due, Stage::MiniQuiz),
    (engage_due, Stage::EngagingQuestion),
    (progress_due, Stage::ProgressCheck),
    (always, Stage::ProgressiveRecap),
];

/// Classify one turn.
///
/// An in-progress quiz overrides the rule table entirely: whatever the
/// student says next is treated as their quiz answer.
pub fn classify(session: &Session, utterance: &str) -> Stage {
    if session.active_quiz.is_some() {
        return Stage::QuizFeedback;
    }

    for (predicate, stage) in STAGE_RULES {
        if predicate(session, utterance) {
            return *stage;
        }
    }

    // Unreachable while the table keeps its catch-all entry.
    Stage::General
}

fn is_first_turn(session: &Session, _utterance: &str) -> bool {
    session.conversation_count == 1
}

fn is_question(_session: &Session, utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    QUESTION_TOKENS.iter().any(|token| lower.contains(token))
}

fn quiz_due(session: &Session, _utterance: &str) -> bool {
    session.conversation_count > 5 && session.conversation_count % 5 == 0
}

fn engage_due(session: &Session, _utterance: &str) -> bool {
    session.conversation_count > 2 && session.conversation_count % 3 == 0
}

fn progress_due(session: &Session, _utterance: &str) -> bool {
    session.conversation_count > 8 && session.conversation_count % 8 == 0
}

fn always(_session: &Session, _utterance: &str) -> bool {
    true
}

// ============================================================================
// Tests
// ============================================================================
