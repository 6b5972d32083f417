//! Topic listing command implementation.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use revaid::config::Config;
use revaid::content::{ContentCatalog, FileContentStore};

pub async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path).await?;
    let content_path = super::content_path(Path::new(config_path), &config);

    let catalog = ContentCatalog::new(Arc::new(FileContentStore::new(&content_path)));
    let topics = catalog.list_topics().await;

    if topics.is_empty() {
        println!("No topics found in {}", content_path.display());
        return Ok(());
    }

    for topic in topics {
        println!(
            "{} ({} chunks) - {}",
            topic.topic, topic.chunk_count, topic.description
        );
    }
    Ok(())
}
