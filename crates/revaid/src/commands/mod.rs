//! CLI command implementations.

use std::path::{Path, PathBuf};

use revaid::config::{self, Config};

pub mod serve;
pub mod topics;

/// Resolve the workspace directory for a loaded config.
fn workspace_dir(config_path: &Path, config: &Config) -> PathBuf {
    let raw = config
        .workspace
        .as_deref()
        .unwrap_or(Path::new(config::DEFAULT_WORKSPACE));
    config::resolve_path(config_path, raw)
}

/// Resolve the content corpus path for a loaded config.
fn content_path(config_path: &Path, config: &Config) -> PathBuf {
    config
        .content
        .path
        .as_ref()
        .map(|p| config::resolve_path(config_path, p))
        .unwrap_or_else(|| workspace_dir(config_path, config).join(config::DEFAULT_CONTENT_FILE))
}

/// Resolve the sessions directory for a loaded config.
fn sessions_path(config_path: &Path, config: &Config) -> PathBuf {
    config
        .sessions
        .path
        .as_ref()
        .map(|p| config::resolve_path(config_path, p))
        .unwrap_or_else(|| workspace_dir(config_path, config).join(config::DEFAULT_SESSIONS_DIR))
}
