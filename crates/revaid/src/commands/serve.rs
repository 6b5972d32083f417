//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use revaid::config::Config;
use revaid::content::{ContentCatalog, FileContentStore};
use revaid::llm::{GeminiGenerator, TextGenerator};
use revaid::revision::RevisionEngine;
use revaid::server::{self, AppState};
use revaid::session::SessionRegistry;
use revaid::store::FileSessionStore;
use revaid::topics::TopicTable;

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let config_path_ref = Path::new(config_path);
    let content_path = super::content_path(config_path_ref, &config);
    let sessions_path = super::sessions_path(config_path_ref, &config);

    // Content catalog over the JSONL corpus
    let catalog = ContentCatalog::new(Arc::new(FileContentStore::new(&content_path)));
    let topic_count = catalog.list_topics().await.len();
    info!(
        path = %content_path.display(),
        topics = topic_count,
        "Loaded content corpus"
    );

    // Session registry over the durable store
    let registry = SessionRegistry::new(Arc::new(FileSessionStore::new(&sessions_path)));

    // Text generator
    let api_key = match config.generator.api_key.clone() {
        Some(key) => key,
        None => std::env::var("GEMINI_API_KEY").context(
            "no generator API key configured (set generator.api_key or GEMINI_API_KEY)",
        )?,
    };
    let mut generator = GeminiGenerator::new(api_key, &config.generator.model)
        .with_temperature(config.generator.temperature);
    if let Some(base_url) = &config.generator.base_url {
        generator = generator.with_base_url(base_url);
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(generator);

    let engine = Arc::new(RevisionEngine::new(
        catalog,
        registry.clone(),
        generator,
        TopicTable::new(&config.topics),
    ));

    // Spawn session TTL expiry loop
    if config.sessions.ttl_hours > 0 {
        let expiry_registry = registry.clone();
        let ttl_hours = config.sessions.ttl_hours;
        tokio::spawn(async move {
            let ttl = chrono::Duration::hours(ttl_hours as i64);
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
            interval.tick().await; // skip immediate tick
            loop {
                interval.tick().await;
                expiry_registry.expire_inactive(ttl).await;
            }
        });
        info!(
            ttl_hours = config.sessions.ttl_hours,
            "Session TTL expiry enabled"
        );
    }

    let state = AppState {
        engine,
        max_connections: config.server.max_connections,
    };
    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
