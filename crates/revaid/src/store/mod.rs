//! Durable session persistence.
//!
//! The store holds two things per session: a latest-state snapshot (the
//! restore source of truth) and an append-only turn log. Writes from the hot
//! path are best-effort; the registry owns the log-and-continue policy.

pub mod error;

mod file;
mod session;

pub use error::{StorageError, StorageResult};
pub use file::FileSessionStore;
pub use session::SessionStore;
