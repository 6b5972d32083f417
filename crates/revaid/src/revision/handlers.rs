//! One handler per pedagogical stage.
//!
//! Each handler composes content-store results and one text-generation call
//! into a stage reply, mutating session progress as it goes. Handlers
//! receive the session for the duration of a single turn; the engine owns
//! locking and persistence.
//!
//! Generator faults propagate out of the handler and are degraded to a
//! generic continuation at the dispatch boundary in the engine, so a raw
//! fault never reaches the caller.

use tracing::debug;

use crate::content::ContentCatalog;
use crate::llm::{GeneratorError, Message, Role, TextGenerator};
use crate::prompts;
use crate::session::{AwaitedAnswer, QuizState, Session, Stage};

use super::reply::completion_percentage;

// ============================================================================
// Constants
// ============================================================================

/// Most recent concepts a mini-quiz draws from.
const QUIZ_CONCEPT_WINDOW: usize = 3;

/// Chunk hits used as context when answering a student question.
const QUESTION_CONTEXT_LIMIT: usize = 3;

/// Characters kept when a chunk is too short to yield a three-word label.
const CONCEPT_LABEL_MAX_CHARS: usize = 50;

// ============================================================================
// Stage Outcome
// ============================================================================

/// What a stage handler decided for this turn.
#[derive(Debug)]
pub(crate) enum StageOutcome {
    /// A normal reply; the engine merges session metadata into it.
    Reply {
        response: String,
        stage: Stage,
        sources: Vec<String>,
    },
    /// The progress policy decided the session is finished; the engine runs
    /// the completion flow instead of replying from the handler.
    Complete,
}

impl StageOutcome {
    fn reply(response: String, stage: Stage) -> Self {
        Self::Reply {
            response,
            stage,
            sources: Vec::new(),
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Route a classified turn to its stage handler.
///
/// `general` shares the progressive-recap behavior. A pending
/// engaging-question flag is consumed here: whatever the student sent this
/// turn is their answer.
pub(crate) async fn dispatch(
    stage: Stage,
    session: &mut Session,
    message: &str,
    catalog: &ContentCatalog,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    if let Some(pending) = session.awaiting_answer.take() {
        debug!(
            session_id = %session.session_id,
            concept = %pending.concept,
            "Pending question answered by this turn"
        );
    }

    match stage {
        Stage::KickoffResponse => topic_kickoff(session, message, generator).await,
        Stage::ProgressiveRecap | Stage::General => progressive_recap(session, generator).await,
        Stage::EngagingQuestion => engaging_question(session, generator).await,
        Stage::MiniQuiz => mini_quiz(session, message, generator).await,
        Stage::QuizFeedback => quiz_feedback(session, message, generator).await,
        Stage::UserQuestion => user_question(session, message, catalog, generator).await,
        Stage::ProgressCheck => progress_check(session, generator).await,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// First continuation turn: note the requested pace and deliver chunk 0.
///
/// The pace keyword only steers logging; delivery always walks the chunk
/// sequence one concept at a time. With no chunks available the kickoff
/// falls back to a content-free greeting.
async fn topic_kickoff(
    session: &mut Session,
    message: &str,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    let pace = if message.to_lowercase().contains("deep") {
        "deep dive"
    } else {
        "quick recap"
    };
    debug!(session_id = %session.session_id, pace, "Student chose revision pace");

    session.current_chunk_index = 0;
    let chunk = session.current_chunk().cloned();
    let Some(chunk) = chunk else {
        let prompt = prompts::topic_kickoff(&session.topic, "");
        let response = generate_tutor(generator, &prompt).await?;
        return Ok(StageOutcome::reply(response, Stage::KickoffResponse));
    };

    session.record_concept(&concept_label(&chunk.text));

    let total = session.concept_chunks.len();
    let prompt = prompts::progressive_recap(&session.topic, &chunk.text, 1, total);
    let response = generate_tutor(generator, &prompt).await?;

    Ok(StageOutcome::Reply {
        response,
        stage: Stage::KickoffResponse,
        sources: vec![chunk.chunk_id],
    })
}

/// Advance the cursor and explain the next chunk.
///
/// When the sequence is exhausted the turn routes to the progress check
/// instead of reading past the end.
async fn progressive_recap(
    session: &mut Session,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    let chunk = session.advance_chunk().cloned();
    let Some(chunk) = chunk else {
        return progress_check(session, generator).await;
    };

    session.record_concept(&concept_label(&chunk.text));

    let position = session.current_chunk_index + 1;
    let total = session.concept_chunks.len();
    let prompt = prompts::progressive_recap(&session.topic, &chunk.text, position, total);
    let response = generate_tutor(generator, &prompt).await?;

    Ok(StageOutcome::Reply {
        response,
        stage: Stage::ProgressiveRecap,
        sources: vec![chunk.chunk_id],
    })
}

/// Pose one interactive question about the most recent concept.
async fn engaging_question(
    session: &mut Session,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    let difficulty = match (session.conversation_count / 6).min(2) {
        0 => "easy",
        1 => "medium",
        _ => "hard",
    };
    let concept = session
        .key_concepts_covered
        .last()
        .cloned()
        .unwrap_or_else(|| session.topic.clone());

    let prompt = prompts::engaging_question(&session.topic, &concept, difficulty);
    let response = generate_tutor(generator, &prompt).await?;

    session.awaiting_answer = Some(AwaitedAnswer { concept });

    Ok(StageOutcome::reply(response, Stage::EngagingQuestion))
}

/// Build a short quiz over the most recently covered concepts.
///
/// A quiz already in progress means this turn carries the student's answers,
/// so it routes to evaluation instead of stacking a second quiz.
async fn mini_quiz(
    session: &mut Session,
    message: &str,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    if session.active_quiz.is_some() {
        return quiz_feedback(session, message, generator).await;
    }

    let concepts: Vec<String> = if session.key_concepts_covered.is_empty() {
        vec![session.topic.clone()]
    } else {
        let skip = session
            .key_concepts_covered
            .len()
            .saturating_sub(QUIZ_CONCEPT_WINDOW);
        session.key_concepts_covered[skip..].to_vec()
    };
    let num_questions = concepts.len().min(QUIZ_CONCEPT_WINDOW);

    let prompt = prompts::mini_quiz(&session.topic, &concepts, num_questions);
    let response = generate_tutor(generator, &prompt).await?;

    session.active_quiz = Some(QuizState { concepts });

    Ok(StageOutcome::reply(response, Stage::MiniQuiz))
}

/// Evaluate a quiz answer with encouragement.
///
/// No answer key exists; judging correctness is left to the generator from
/// the raw answer and the quizzed concept set.
async fn quiz_feedback(
    session: &mut Session,
    message: &str,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    let concepts = match session.active_quiz.take() {
        Some(quiz) => quiz.concepts,
        None => vec![session.topic.clone()],
    };

    let prompt = prompts::quiz_feedback(&session.topic, message, &concepts);
    let response = generate_tutor(generator, &prompt).await?;

    Ok(StageOutcome::reply(response, Stage::QuizFeedback))
}

/// Answer a student question from topic-scoped search context.
///
/// A content-store fault surfaces here as empty hits, so the answer is
/// generated without context and the reply cites no sources.
async fn user_question(
    session: &mut Session,
    message: &str,
    catalog: &ContentCatalog,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    let hits = catalog
        .search(&session.topic, message, QUESTION_CONTEXT_LIMIT)
        .await;
    let context = hits
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let sources = hits.into_iter().map(|chunk| chunk.chunk_id).collect();

    let prompt = prompts::question_handling(message, &session.topic, &context);
    let response = generate_tutor(generator, &prompt).await?;

    Ok(StageOutcome::Reply {
        response,
        stage: Stage::UserQuestion,
        sources,
    })
}

/// Report progress, or signal completion once the policy is met.
async fn progress_check(
    session: &Session,
    generator: &dyn TextGenerator,
) -> Result<StageOutcome, GeneratorError> {
    let total = session.concept_chunks.len();
    let covered = session.key_concepts_covered.len();
    let percentage = completion_percentage(session);

    if percentage >= 90.0
        || (total > 0 && covered >= total)
        || session.conversation_count >= session.completion_threshold
    {
        return Ok(StageOutcome::Complete);
    }

    let prompt = prompts::progress_update(&session.topic, covered, total, percentage);
    let response = generate_tutor(generator, &prompt).await?;

    Ok(StageOutcome::reply(response, Stage::ProgressCheck))
}

// ============================================================================
// Helpers
// ============================================================================

/// Label a chunk by its first three words, or the truncated text when the
/// chunk is shorter than that.
fn concept_label(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() >= 3 {
        words[..3].join(" ")
    } else {
        text.chars()
            .take(CONCEPT_LABEL_MAX_CHARS)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

async fn generate_tutor(
    generator: &dyn TextGenerator,
    prompt: &str,
) -> Result<String, GeneratorError> {
    let messages = [
        Message::text(Role::System, prompts::TUTOR_SYSTEM_INSTRUCTION),
        Message::text(Role::User, prompt),
    ];
    generator.generate(&messages).await
}

// ============================================================================
// Tests
// ============================================================================
