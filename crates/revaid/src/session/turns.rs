//! Turn log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// One entry in a session's append-only turn log.
///
/// Never mutated after append. `user_message` is absent for the start turn,
/// which has no student input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    pub assistant_message: String,
    pub stage: Stage,
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    #[must_use]
    pub fn new(
        turn: u32,
        user_message: Option<String>,
        assistant_message: impl Into<String>,
        stage: Stage,
    ) -> Self {
        Self {
            turn,
            user_message,
            assistant_message: assistant_message.into(),
            stage,
            timestamp: Utc::now(),
        }
    }
}
