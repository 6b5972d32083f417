use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Per-topic pacing overrides (matched by normalized name, in order).
    #[serde(default)]
    pub topics: Vec<TopicOverride>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// If the path is absolute, it is returned as-is.
/// If the path is relative, it is joined with the config file's parent directory.
///
/// This ensures consistent behavior regardless of the current working directory.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default workspace directory (relative to config file).
pub const DEFAULT_WORKSPACE: &str = ".revaid";
/// Default sessions directory (relative to workspace).
pub const DEFAULT_SESSIONS_DIR: &str = "sessions";
/// Default content corpus file (relative to workspace).
pub const DEFAULT_CONTENT_FILE: &str = "content/chunks.jsonl";

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    300
}

fn default_max_connections() -> usize {
    100
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports the following syntax (shell-compatible):
/// - `${VAR}` - Required variable, errors if not set
/// - `${VAR:-default}` - Optional variable with default value
/// - `${VAR:-}` - Optional variable, empty string if not set
/// - `$$` - Escaped `$` (only needed before `{` to prevent expansion)
///
/// No nested expansion: `${VAR:-${DEFAULT}}` is not supported, and an
/// unclosed `${` (missing `}`) returns an error.
///
/// # Examples
///
/// ```yaml
/// generator:
///   # Required - errors if GEMINI_API_KEY is not set
///   api_key: ${GEMINI_API_KEY}
///
/// server:
///   host: ${HOST:-0.0.0.0}
///   port: ${PORT:-8000}
///
/// # Plain $ doesn't need escaping
/// note: costs $100
/// ```
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find('$') {
        result.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        if let Some(after) = tail.strip_prefix("$$") {
            // Escaped $ -> literal $
            result.push('$');
            rest = after;
        } else if let Some(reference) = tail.strip_prefix("${") {
            let Some(end) = reference.find('}') else {
                return Err(ConfigError::UnclosedVarReference);
            };
            result.push_str(&lookup_var(&reference[..end])?);
            rest = &reference[end + 1..];
        } else {
            // Not a variable reference, keep literal $
            result.push('$');
            rest = &tail[1..];
        }
    }
    result.push_str(rest);

    Ok(result)
}

/// Resolve the inside of a `${...}` reference, honoring `:-` defaults.
fn lookup_var(reference: &str) -> Result<String, ConfigError> {
    let (name, default_value) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match std::env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => match default_value {
            Some(default) => Ok(default.to_string()),
            None => Err(ConfigError::MissingEnvVar(name.to_string())),
        },
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

// ============================================================================
// ContentConfig
// ============================================================================

/// Configuration for the study-content corpus.
#[derive(Debug, Default, Deserialize)]
pub struct ContentConfig {
    /// Path to the JSONL chunk corpus (relative to workspace).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// SessionsConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    /// Directory holding per-session state (relative to workspace).
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Evict cached sessions idle longer than this. `0` disables the sweep;
    /// evicted sessions are still restorable from disk.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            path: None,
            ttl_hours: default_ttl_hours(),
        }
    }
}

// ============================================================================
// GeneratorConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// API key for the hosted model. Falls back to `GEMINI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override the provider endpoint (used by tests and proxies).
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
        }
    }
}

// ============================================================================
// TopicOverride
// ============================================================================

/// Pacing limits for a single topic, overriding the built-in table.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicOverride {
    pub name: String,
    pub max_conversations: u32,
    pub completion_threshold: u32,
}

// ============================================================================
// Tests
// ============================================================================
