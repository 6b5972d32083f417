//! Topic pacing configuration.
//!
//! Maps a free-text topic name to session limits. Resolution never fails:
//! unknown topics silently receive the process-wide defaults.

use crate::config::TopicOverride;

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_MAX_CONVERSATIONS: u32 = 25;
pub const DEFAULT_COMPLETION_THRESHOLD: u32 = 15;

/// Built-in limits, in priority order for substring ties.
const BUILTIN_LIMITS: &[(&str, TopicLimits)] = &[
    (
        "photosynthesis",
        TopicLimits {
            max_conversations: 30,
            completion_threshold: 20,
        },
    ),
    (
        "nutrition",
        TopicLimits {
            max_conversations: 30,
            completion_threshold: 20,
        },
    ),
];

// ============================================================================
// TopicLimits
// ============================================================================

/// Pacing limits for one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicLimits {
    /// Hard cap on continuation turns before the session is wound down.
    pub max_conversations: u32,
    /// Turn count at which a progress check may complete the session.
    pub completion_threshold: u32,
}

impl Default for TopicLimits {
    fn default() -> Self {
        Self {
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
        }
    }
}

// ============================================================================
// TopicTable
// ============================================================================

/// Resolver from topic name to [`TopicLimits`].
///
/// Config-file overrides are consulted before the built-in table.
#[derive(Debug, Clone, Default)]
pub struct TopicTable {
    overrides: Vec<(String, TopicLimits)>,
}

impl TopicTable {
    pub fn new(overrides: &[TopicOverride]) -> Self {
        Self {
            overrides: overrides
                .iter()
                .filter(|o| !o.name.trim().is_empty())
                .map(|o| {
                    (
                        o.name.trim().to_lowercase(),
                        TopicLimits {
                            max_conversations: o.max_conversations,
                            completion_threshold: o.completion_threshold,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Resolve limits for a topic name.
    ///
    /// Normalizes (lowercase, trim), then tries an exact match, then a
    /// substring match in both directions with table order as the tie-break,
    /// then falls back to the defaults.
    pub fn resolve(&self, topic: &str) -> TopicLimits {
        let needle = topic.trim().to_lowercase();
        if needle.is_empty() {
            return TopicLimits::default();
        }

        if let Some(limits) = self
            .entries()
            .find(|(name, _)| *name == needle)
            .map(|(_, limits)| limits)
        {
            return limits;
        }

        self.entries()
            .find(|(name, _)| name.contains(&needle) || needle.contains(name))
            .map(|(_, limits)| limits)
            .unwrap_or_default()
    }

    /// Overrides first, then built-ins, preserving declaration order.
    fn entries(&self) -> impl Iterator<Item = (&str, TopicLimits)> {
        self.overrides
            .iter()
            .map(|(name, limits)| (name.as_str(), *limits))
            .chain(BUILTIN_LIMITS.iter().map(|(name, limits)| (*name, *limits)))
    }
}

// ============================================================================
// Tests
// ============================================================================
