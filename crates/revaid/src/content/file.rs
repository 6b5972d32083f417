//! JSONL-backed content store implementation.
//!
//! The corpus is a single file with one JSON chunk per line:
//!
//! ```text
//! {"chunk_id":"photo_001","topic":"photosynthesis","text":"..."}
//! ```
//!
//! Line order is the authoritative chunk order within each topic. Reads go to
//! disk on every call so corpus edits show up without a restart; malformed
//! lines are skipped with a warning instead of failing the query.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use super::store::{ContentChunk, ContentError, ContentResult, ContentStore, TopicSummary};

/// File-based implementation of `ContentStore`.
#[derive(Debug, Clone)]
pub struct FileContentStore {
    corpus_path: PathBuf,
}

impl FileContentStore {
    /// Create a store reading from the given JSONL corpus file.
    ///
    /// A missing file behaves as an empty corpus.
    pub fn new(corpus_path: impl Into<PathBuf>) -> Self {
        Self {
            corpus_path: corpus_path.into(),
        }
    }

    /// Read and parse the whole corpus, preserving line order.
    async fn read_corpus(&self) -> ContentResult<Vec<ContentChunk>> {
        let contents = match fs::read_to_string(&self.corpus_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ContentError::file_io(&self.corpus_path, e)),
        };

        let mut chunks = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ContentChunk>(trimmed) {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => {
                    warn!(
                        path = %self.corpus_path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping malformed content record"
                    );
                }
            }
        }

        Ok(chunks)
    }
}

/// Count query terms that appear as whole words in `text_lower`.
fn term_score(text_lower: &str, terms: &[&str]) -> usize {
    terms
        .iter()
        .filter(|term| {
            text_lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == **term)
        })
        .count()
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn topics(&self) -> ContentResult<Vec<TopicSummary>> {
        let corpus = self.read_corpus().await?;

        // First-seen order, one entry per distinct topic.
        let mut counts: Vec<(String, usize)> = Vec::new();
        for chunk in &corpus {
            match counts.iter_mut().find(|(t, _)| *t == chunk.topic) {
                Some((_, n)) => *n += 1,
                None => counts.push((chunk.topic.clone(), 1)),
            }
        }

        Ok(counts
            .into_iter()
            .map(|(topic, n)| TopicSummary::new(topic, n))
            .collect())
    }

    async fn chunks(&self, topic: &str, limit: usize) -> ContentResult<Vec<ContentChunk>> {
        let corpus = self.read_corpus().await?;
        Ok(corpus
            .into_iter()
            .filter(|c| c.topic == topic)
            .take(limit)
            .collect())
    }

    async fn all_chunks(&self, topic: &str) -> ContentResult<Vec<ContentChunk>> {
        let corpus = self.read_corpus().await?;
        Ok(corpus.into_iter().filter(|c| c.topic == topic).collect())
    }

    async fn search(
        &self,
        topic: &str,
        query: &str,
        limit: usize,
    ) -> ContentResult<Vec<ContentChunk>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let corpus = self.read_corpus().await?;
        let terms: Vec<&str> = needle
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        // Rank by whole-word term hits; the stable sort keeps corpus order
        // between equal scores.
        let mut ranked: Vec<(usize, &ContentChunk)> = corpus
            .iter()
            .filter(|c| c.topic == topic)
            .filter_map(|c| {
                let score = term_score(&c.text.to_lowercase(), &terms);
                (score > 0).then_some((score, c))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        if !ranked.is_empty() {
            return Ok(ranked
                .into_iter()
                .take(limit)
                .map(|(_, c)| c.clone())
                .collect());
        }

        // No word-level hits: substring scan over the same scope.
        Ok(corpus
            .iter()
            .filter(|c| c.topic == topic && c.text.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}
