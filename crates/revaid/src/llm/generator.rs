//! Text generator trait and shared types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Prompt Types
// ============================================================================

/// A role-tagged message in a generation prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a message with the given role and text.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// The role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur when making generation API calls.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response carried no usable text
    #[error("generation response contained no text")]
    Empty,
}

// ============================================================================
// TextGenerator Trait
// ============================================================================

/// Black-box text generation.
///
/// Implementations are asynchronous, fallible, and order-preserving per call.
/// A generation fault fails the calling turn only; session state is handled
/// by the caller.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce one text result from an ordered prompt.
    async fn generate(&self, messages: &[Message]) -> Result<String, GeneratorError>;
}
