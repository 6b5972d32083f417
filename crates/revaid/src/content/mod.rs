//! Topic content access.
//!
//! The corpus is a flat collection of immutable chunks, each owned by a topic.
//! Chunk order within a topic is stable and defines the progressive-recap
//! sequence a session walks with its cursor.
//!
//! All tutoring code reads content through [`ContentCatalog`], the fail-open
//! boundary: store faults are logged and degraded to empty results so a
//! tutoring turn never hard-fails on content availability. Handlers already
//! fall back to generic prompts when content comes back empty.

mod catalog;
mod file;
mod store;

pub use catalog::ContentCatalog;
pub use file::FileContentStore;
pub use store::{ContentChunk, ContentError, ContentResult, ContentStore, TopicSummary};
