//! Fail-open catalog over a content store.

use std::sync::Arc;

use tracing::warn;

use super::store::{ContentChunk, ContentStore, TopicSummary};

/// Fail-open view over a [`ContentStore`].
///
/// Every operation degrades to an empty result when the underlying store
/// faults, so callers can never observe a store error here. They must treat
/// empty content as "nothing available" and fall back to generic prompting.
#[derive(Clone)]
pub struct ContentCatalog {
    store: Arc<dyn ContentStore>,
}

impl ContentCatalog {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Distinct topics with chunk counts; empty on store failure.
    pub async fn list_topics(&self) -> Vec<TopicSummary> {
        match self.store.topics().await {
            Ok(topics) => topics,
            Err(e) => {
                warn!(error = %e, "content store failed listing topics");
                Vec::new()
            }
        }
    }

    /// Ordered chunks for a topic, truncated at `limit`; empty on failure.
    pub async fn chunks(&self, topic: &str, limit: usize) -> Vec<ContentChunk> {
        match self.store.chunks(topic, limit).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(topic, error = %e, "content store failed fetching chunks");
                Vec::new()
            }
        }
    }

    /// Full ordered chunk sequence for a topic; empty on failure.
    pub async fn all_chunks(&self, topic: &str) -> Vec<ContentChunk> {
        match self.store.all_chunks(topic).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(topic, error = %e, "content store failed fetching full chunk set");
                Vec::new()
            }
        }
    }

    /// Ranked search scoped to a topic; empty on failure or no match.
    pub async fn search(&self, topic: &str, query: &str, limit: usize) -> Vec<ContentChunk> {
        match self.store.search(topic, query, limit).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(topic, error = %e, "content store failed searching");
                Vec::new()
            }
        }
    }
}
