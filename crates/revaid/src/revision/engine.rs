//! Session lifecycle orchestration.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::content::ContentCatalog;
use crate::llm::{GeneratorError, Message, Role, TextGenerator};
use crate::prompts;
use crate::session::{Session, SessionRegistry, SessionSnapshot, Stage, TurnRecord, classify};
use crate::topics::TopicTable;

use super::handlers::{StageOutcome, dispatch};
use super::reply::{RevisionReply, SessionStats};

// ============================================================================
// Constants
// ============================================================================

/// Phrases that end a session manually, matched case-insensitively anywhere
/// in the utterance and checked before stage classification.
const END_PHRASES: &[&str] = &["end session", "finish", "complete", "done", "exit", "summary"];

/// Chunks fetched as context for the kickoff greeting.
const INITIAL_CONTEXT_CHUNKS: usize = 3;

// ============================================================================
// Errors
// ============================================================================

/// Errors a lifecycle call can surface to the API layer.
///
/// Continuation turns degrade collaborator faults internally; the only hard
/// failure a continuation returns is an unknown session id.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session id is unknown in both cache and durable store.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Kickoff generation failed while starting a session.
    #[error("text generation failed: {0}")]
    Generation(#[from] GeneratorError),
}

// ============================================================================
// RevisionEngine
// ============================================================================

/// Orchestrates session creation, continuation, and completion.
///
/// Each continuation runs under that session's mutex, so turns for one
/// session are strictly serialized while distinct sessions proceed in
/// parallel.
pub struct RevisionEngine {
    catalog: ContentCatalog,
    registry: SessionRegistry,
    generator: Arc<dyn TextGenerator>,
    topics: TopicTable,
}

impl RevisionEngine {
    pub fn new(
        catalog: ContentCatalog,
        registry: SessionRegistry,
        generator: Arc<dyn TextGenerator>,
        topics: TopicTable,
    ) -> Self {
        Self {
            catalog,
            registry,
            generator,
            topics,
        }
    }

    /// The session registry backing this engine.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The content façade backing this engine.
    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Start a new revision session.
    ///
    /// Resolves topic limits, seeds the full chunk sequence, generates the
    /// kickoff greeting, and persists the initial snapshot plus a turn-0
    /// record. The counter stays at 0; the first continuation becomes turn 1.
    pub async fn start_session(
        &self,
        topic: &str,
        student_id: &str,
        session_id: Option<String>,
    ) -> Result<RevisionReply, EngineError> {
        let topic = topic.trim();
        let limits = self.topics.resolve(topic);
        let session_id = session_id.unwrap_or_else(new_session_id);

        let mut session = Session::new(session_id, topic, student_id, limits);
        session.concept_chunks = self.catalog.all_chunks(topic).await;

        let initial = self.catalog.chunks(topic, INITIAL_CONTEXT_CHUNKS).await;
        let context = initial
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let sources: Vec<String> = initial.into_iter().map(|chunk| chunk.chunk_id).collect();

        let prompt = prompts::topic_kickoff(topic, &context);
        let messages = [
            Message::text(Role::System, prompts::TUTOR_SYSTEM_INSTRUCTION),
            Message::text(Role::User, prompt),
        ];
        let response = self.generator.generate(&messages).await?;

        info!(
            session_id = %session.session_id,
            topic = %session.topic,
            chunks = session.concept_chunks.len(),
            "Started revision session"
        );

        let record = TurnRecord::new(0, None, &response, Stage::KickoffResponse);
        self.registry.append_turn(&session.session_id, &record).await;
        self.registry.persist(&session).await;

        let reply = reply_for(&session, response, Stage::KickoffResponse, sources);
        self.registry.insert(session);
        Ok(reply)
    }

    /// Process one continuation turn.
    ///
    /// The counter increments before anything else, so a turn counts even
    /// when its handler degrades. Manual-end phrases and already-completed
    /// sessions short-circuit to the completion flow; everything else goes
    /// through classification and stage dispatch.
    pub async fn continue_session(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<RevisionReply, EngineError> {
        let handle = self
            .registry
            .get(session_id)
            .await
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
        let mut session = handle.lock().await;

        session.conversation_count += 1;
        session.last_interaction = Utc::now();

        let reply = if session.is_complete || is_manual_end(message) {
            self.conclude(&mut session).await
        } else {
            let stage = classify(&session, message);
            debug!(
                session_id = %session.session_id,
                turn = session.conversation_count,
                stage = %stage,
                "Classified turn"
            );

            match dispatch(
                stage,
                &mut session,
                message,
                &self.catalog,
                self.generator.as_ref(),
            )
            .await
            {
                Ok(StageOutcome::Reply {
                    response,
                    stage,
                    sources,
                }) => reply_for(&session, response, stage, sources),
                Ok(StageOutcome::Complete) => self.conclude(&mut session).await,
                Err(e) => {
                    warn!(
                        session_id = %session.session_id,
                        stage = %stage,
                        error = %e,
                        "Stage handler failed, continuing generically"
                    );
                    reply_for(
                        &session,
                        prompts::GENERIC_CONTINUATION.to_string(),
                        Stage::General,
                        Vec::new(),
                    )
                }
            }
        };

        let record = TurnRecord::new(
            session.conversation_count,
            Some(message.to_string()),
            &reply.response,
            reply.current_stage,
        );
        self.registry.append_turn(&session.session_id, &record).await;
        self.registry.persist(&session).await;

        Ok(reply)
    }

    /// Snapshot one session's current state, restoring from disk on a miss.
    pub async fn session_view(&self, session_id: &str) -> Option<SessionSnapshot> {
        let handle = self.registry.get(session_id).await?;
        let session = handle.lock().await;
        Some(SessionSnapshot::from_session(&session))
    }

    // ------------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------------

    /// Run the completion flow for a session.
    ///
    /// The conclusion narrative is generated first; the completion flag only
    /// flips once generation succeeds, so a failed conclusion can be retried
    /// on the next turn. Re-running completion on an already-complete
    /// session just regenerates the summary.
    async fn conclude(&self, session: &mut Session) -> RevisionReply {
        let stats = SessionStats::for_session(session);
        let prompt = prompts::conclusion(
            &session.topic,
            &session.key_concepts_covered,
            stats.total_turns,
            stats.duration_minutes,
            stats.completion_rate,
        );
        let messages = [
            Message::text(Role::System, prompts::CONCLUSION_SYSTEM_INSTRUCTION),
            Message::text(Role::User, prompt),
        ];

        match self.generator.generate(&messages).await {
            Ok(summary) => {
                session.mark_complete();
                info!(
                    session_id = %session.session_id,
                    turns = stats.total_turns,
                    concepts = stats.concepts_covered,
                    "Completed revision session"
                );

                let mut reply =
                    reply_for(session, summary.clone(), Stage::ProgressCheck, Vec::new());
                reply.session_summary = Some(summary);
                reply.next_suggested_action = Some(prompts::NEXT_SUGGESTED_ACTION.to_string());
                reply.session_stats = Some(stats);
                reply
            }
            Err(e) => {
                warn!(
                    session_id = %session.session_id,
                    error = %e,
                    "Conclusion generation failed, continuing generically"
                );
                reply_for(
                    session,
                    prompts::GENERIC_CONTINUATION.to_string(),
                    Stage::General,
                    Vec::new(),
                )
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn is_manual_end(message: &str) -> bool {
    let lower = message.to_lowercase();
    END_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn new_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

/// Merge session metadata into a stage reply.
fn reply_for(
    session: &Session,
    response: String,
    stage: Stage,
    sources: Vec<String>,
) -> RevisionReply {
    RevisionReply {
        response,
        topic: session.topic.clone(),
        session_id: session.session_id.clone(),
        conversation_count: session.conversation_count,
        is_session_complete: session.is_complete,
        session_summary: None,
        sources,
        current_stage: stage,
        max_conversations: session.max_conversations,
        completion_threshold: session.completion_threshold,
        next_suggested_action: None,
        session_stats: None,
        timestamp: Utc::now(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentChunk, ContentResult, ContentStore, TopicSummary};
    use crate::store::FileSessionStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // ------------------------------------------------------------------------
    // Stubs
    // ------------------------------------------------------------------------

    /// Succeeds for the first `ok_calls` generations, then fails.
    struct ScriptedGenerator {
        reply: String,
        ok_calls: Option<u32>,
        calls: Mutex<u32>,
    }

    impl ScriptedGenerator {
        fn always(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                ok_calls: None,
                calls: Mutex::new(0),
            }
        }

        fn failing_after(reply: &str, ok_calls: u32) -> Self {
            Self {
                reply: reply.to_string(),
                ok_calls: Some(ok_calls),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _messages: &[Message]) -> Result<String, GeneratorError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if let Some(ok_calls) = self.ok_calls
                && *calls > ok_calls
            {
                return Err(GeneratorError::Empty);
            }
            Ok(self.reply.clone())
        }
    }

    struct StaticStore {
        chunks: Vec<ContentChunk>,
    }

    #[async_trait]
    impl ContentStore for StaticStore {
        async fn topics(&self) -> ContentResult<Vec<TopicSummary>> {
            Ok(Vec::new())
        }

        async fn chunks(&self, topic: &str, limit: usize) -> ContentResult<Vec<ContentChunk>> {
            Ok(self
                .chunks
                .iter()
                .filter(|c| c.topic == topic)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn all_chunks(&self, topic: &str) -> ContentResult<Vec<ContentChunk>> {
            self.chunks(topic, usize::MAX).await
        }

        async fn search(
            &self,
            topic: &str,
            _query: &str,
            limit: usize,
        ) -> ContentResult<Vec<ContentChunk>> {
            self.chunks(topic, limit).await
        }
    }

    fn nutrition_corpus() -> Vec<ContentChunk> {
        [
            "Carbohydrates provide quick energy",
            "Proteins build and repair tissue",
            "Fats store long-term energy",
            "Vitamins regulate body processes",
            "Minerals support bone health",
        ]
        .iter()
        .enumerate()
        .map(|(i, text)| ContentChunk {
            chunk_id: format!("n{i}"),
            topic: "nutrition".to_string(),
            text: (*text).to_string(),
        })
        .collect()
    }

    fn test_engine(temp_dir: &TempDir, generator: Arc<dyn TextGenerator>) -> RevisionEngine {
        let catalog = ContentCatalog::new(Arc::new(StaticStore {
            chunks: nutrition_corpus(),
        }));
        let store = Arc::new(FileSessionStore::new(temp_dir.path()));
        let registry = SessionRegistry::new(store);
        RevisionEngine::new(catalog, registry, generator, TopicTable::new(&[]))
    }

    // ------------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn start_seeds_chunks_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Welcome!")));

        let reply = engine
            .start_session("nutrition", "student-1", None)
            .await
            .unwrap();

        assert!(reply.session_id.starts_with("sess_"));
        assert_eq!(reply.response, "Welcome!");
        assert_eq!(reply.conversation_count, 0);
        assert_eq!(reply.current_stage, Stage::KickoffResponse);
        assert!(!reply.is_session_complete);
        assert_eq!(reply.sources, vec!["n0", "n1", "n2"]);
        // Built-in topic limits apply.
        assert_eq!(reply.max_conversations, 30);
        assert_eq!(reply.completion_threshold, 20);

        let view = engine.session_view(&reply.session_id).await.unwrap();
        assert_eq!(view.concept_chunks.len(), 5);
        assert_eq!(view.conversation_count, 0);

        let turns = engine
            .registry()
            .store()
            .load_turns(&reply.session_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].turn, 0);
        assert!(turns[0].user_message.is_none());
    }

    #[tokio::test]
    async fn start_accepts_a_caller_session_id() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Hi")));

        let reply = engine
            .start_session("nutrition", "student-1", Some("sess_fixed".to_string()))
            .await
            .unwrap();

        assert_eq!(reply.session_id, "sess_fixed");
        assert!(engine.session_view("sess_fixed").await.is_some());
    }

    #[tokio::test]
    async fn start_with_unknown_topic_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Hi")));

        let reply = engine
            .start_session("unknown_topic_xyz", "student-1", None)
            .await
            .unwrap();

        assert_eq!(reply.max_conversations, 25);
        assert_eq!(reply.completion_threshold, 15);
        // No corpus for the topic: kickoff still works, with nothing to cite.
        assert!(reply.sources.is_empty());
    }

    #[tokio::test]
    async fn start_propagates_generator_failure() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(
            &temp_dir,
            Arc::new(ScriptedGenerator::failing_after("never", 0)),
        );

        let result = engine.start_session("nutrition", "student-1", None).await;

        assert!(matches!(result, Err(EngineError::Generation(_))));
    }

    // ------------------------------------------------------------------------
    // Continue
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn continue_unknown_session_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Hi")));

        let result = engine.continue_session("sess_ghost", "hello").await;

        assert!(matches!(result, Err(EngineError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn counter_increments_by_one_per_turn() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Onward")));

        let started = engine
            .start_session("nutrition", "student-1", None)
            .await
            .unwrap();

        for expected in 1..=4u32 {
            let reply = engine
                .continue_session(&started.session_id, "ok keep going")
                .await
                .unwrap();
            assert_eq!(reply.conversation_count, expected);
        }
    }

    #[tokio::test]
    async fn first_continuation_is_the_kickoff_turn() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Chunk one!")));

        let started = engine
            .start_session("nutrition", "student-1", None)
            .await
            .unwrap();
        let reply = engine
            .continue_session(&started.session_id, "quick recap")
            .await
            .unwrap();

        assert_eq!(reply.current_stage, Stage::KickoffResponse);
        assert_eq!(reply.conversation_count, 1);
        assert_eq!(reply.sources, vec!["n0"]);

        // Turn 2 moves into the recap sequence proper.
        let reply = engine
            .continue_session(&started.session_id, "ok")
            .await
            .unwrap();
        assert_eq!(reply.current_stage, Stage::ProgressiveRecap);
        assert_eq!(reply.sources, vec!["n1"]);
    }

    #[tokio::test]
    async fn manual_end_completes_at_any_turn() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Farewell!")));

        let started = engine
            .start_session("nutrition", "student-1", None)
            .await
            .unwrap();
        let reply = engine
            .continue_session(&started.session_id, "I think we're done")
            .await
            .unwrap();

        assert!(reply.is_session_complete);
        assert_eq!(reply.conversation_count, 1);
        assert_eq!(reply.session_summary.as_deref(), Some("Farewell!"));
        assert_eq!(
            reply.next_suggested_action.as_deref(),
            Some(prompts::NEXT_SUGGESTED_ACTION)
        );
        let stats = reply.session_stats.unwrap();
        assert_eq!(stats.total_turns, 1);
    }

    #[tokio::test]
    async fn completed_session_regenerates_summary() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir, Arc::new(ScriptedGenerator::always("Summary")));

        let started = engine
            .start_session("nutrition", "student-1", None)
            .await
            .unwrap();
        engine
            .continue_session(&started.session_id, "end session")
            .await
            .unwrap();

        let reply = engine
            .continue_session(&started.session_id, "hello again")
            .await
            .unwrap();

        assert!(reply.is_session_complete);
        assert_eq!(reply.conversation_count, 2);
        assert!(reply.session_summary.is_some());
    }

    #[tokio::test]
    async fn handler_fault_degrades_to_generic_turn() {
        let temp_dir = TempDir::new().unwrap();
        // Start succeeds; every later generation fails.
        let engine = test_engine(
            &temp_dir,
            Arc::new(ScriptedGenerator::failing_after("Welcome!", 1)),
        );

        let started = engine
            .start_session("nutrition", "student-1", None)
            .await
            .unwrap();
        let reply = engine
            .continue_session(&started.session_id, "tell me more")
            .await
            .unwrap();

        assert_eq!(reply.response, prompts::GENERIC_CONTINUATION);
        assert_eq!(reply.current_stage, Stage::General);
        assert!(!reply.is_session_complete);
        // The failed turn still counted.
        assert_eq!(reply.conversation_count, 1);
        let next = engine
            .continue_session(&started.session_id, "and more")
            .await
            .unwrap();
        assert_eq!(next.conversation_count, 2);
    }

    #[tokio::test]
    async fn failed_conclusion_leaves_the_flag_unset() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(
            &temp_dir,
            Arc::new(ScriptedGenerator::failing_after("Welcome!", 1)),
        );

        let started = engine
            .start_session("nutrition", "student-1", None)
            .await
            .unwrap();
        let reply = engine
            .continue_session(&started.session_id, "end session")
            .await
            .unwrap();

        assert_eq!(reply.response, prompts::GENERIC_CONTINUATION);
        assert!(!reply.is_session_complete);

        let view = engine.session_view(&started.session_id).await.unwrap();
        assert!(!view.is_complete);
    }

    #[tokio::test]
    async fn manual_end_phrases_are_case_insensitive() {
        assert!(is_manual_end("END SESSION please"));
        assert!(is_manual_end("let's Finish here"));
        assert!(is_manual_end("give me a summary"));
        assert!(!is_manual_end("what about carbohydrates"));
    }
}
