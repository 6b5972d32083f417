//! Session state and classification.
//!
//! A [`Session`] is the canonical record for one student+topic interaction:
//! turn counters, covered concepts, the progressive-delivery chunk cursor,
//! and the quiz/answer flags the classifier consults. The
//! [`SessionRegistry`] owns active sessions: a concurrency-safe in-memory
//! cache over the durable snapshot + turn-log store, restoring on cache miss
//! and writing through best-effort.
//!
//! Callers must serialize turns per session (the registry hands out
//! `Arc<Mutex<Session>>` handles for exactly that); across distinct sessions
//! everything runs in parallel.

mod registry;
mod snapshot;
mod stage;
mod state;
mod turns;

pub use registry::SessionRegistry;
pub use snapshot::SessionSnapshot;
pub use stage::{Stage, classify};
pub use state::{AwaitedAnswer, QuizState, Session};
pub use turns::TurnRecord;
