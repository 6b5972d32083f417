//! File-based storage implementation.
//!
//! Sessions are stored on the local filesystem using:
//! - YAML for the latest-state snapshot
//! - JSONL for the append-only turn log
//!
//! Snapshot writes use atomic operations (temp file + rename) to prevent
//! corruption.

mod session;

pub use session::FileSessionStore;
