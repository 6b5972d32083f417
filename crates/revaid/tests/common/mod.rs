//! Common test utilities.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use revaid::content::{ContentCatalog, FileContentStore};
use revaid::llm::{GeneratorError, Message, TextGenerator};
use revaid::revision::RevisionEngine;
use revaid::server::{self, AppState};
use revaid::session::SessionRegistry;
use revaid::store::FileSessionStore;
use revaid::topics::TopicTable;

/// Generator stub that returns a fixed reply, with an optional call number
/// from which every call fails instead.
pub struct StubGenerator {
    reply: String,
    fail_from: Option<u32>,
    calls: Mutex<u32>,
}

impl StubGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_from: None,
            calls: Mutex::new(0),
        }
    }

    /// Succeed until `call` (1-based), then fail that call and every later one.
    pub fn failing_from(reply: &str, call: u32) -> Self {
        Self {
            reply: reply.to_string(),
            fail_from: Some(call),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _messages: &[Message]) -> Result<String, GeneratorError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if let Some(fail_from) = self.fail_from
            && *calls >= fail_from
        {
            return Err(GeneratorError::Empty);
        }
        Ok(self.reply.clone())
    }
}

/// Write the fixture corpus: five nutrition chunks and three photosynthesis
/// chunks, in corpus order.
pub fn seed_corpus(dir: &Path) -> PathBuf {
    let lines = [
        r#"{"chunk_id":"nutri_0","topic":"nutrition","text":"Carbohydrates provide quick energy"}"#,
        r#"{"chunk_id":"nutri_1","topic":"nutrition","text":"Proteins build and repair tissue"}"#,
        r#"{"chunk_id":"nutri_2","topic":"nutrition","text":"Fats store long-term energy"}"#,
        r#"{"chunk_id":"nutri_3","topic":"nutrition","text":"Vitamins regulate body processes"}"#,
        r#"{"chunk_id":"nutri_4","topic":"nutrition","text":"Minerals support bone health"}"#,
        r#"{"chunk_id":"photo_0","topic":"photosynthesis","text":"Light reactions capture solar energy"}"#,
        r#"{"chunk_id":"photo_1","topic":"photosynthesis","text":"The Calvin cycle fixes carbon dioxide"}"#,
        r#"{"chunk_id":"photo_2","topic":"photosynthesis","text":"Chlorophyll absorbs red and blue light"}"#,
    ];
    let path = dir.join("chunks.jsonl");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// Build an engine over file-backed stores with no topic overrides.
pub fn build_engine(
    corpus: &Path,
    sessions: &Path,
    generator: Arc<dyn TextGenerator>,
) -> RevisionEngine {
    let catalog = ContentCatalog::new(Arc::new(FileContentStore::new(corpus)));
    let registry = SessionRegistry::new(Arc::new(FileSessionStore::new(sessions)));
    RevisionEngine::new(catalog, registry, generator, TopicTable::new(&[]))
}

/// Create a test app over a seeded corpus with the given generator.
pub fn test_app_with(generator: Arc<dyn TextGenerator>) -> Router {
    use tempfile::TempDir;

    let tmp = TempDir::new().unwrap();
    // Leak the TempDir so it doesn't get cleaned up during the test.
    let tmp = Box::leak(Box::new(tmp));

    let corpus = seed_corpus(tmp.path());
    let sessions = tmp.path().join("sessions");
    let engine = build_engine(&corpus, &sessions, generator);

    let state = AppState {
        engine: Arc::new(engine),
        max_connections: 16,
    };
    server::build_app(state, 300)
}

/// Create a test app with a generator that always succeeds.
pub fn test_app() -> Router {
    test_app_with(Arc::new(StubGenerator::new("Stubbed tutor reply")))
}
