//! The session flow controller.
//!
//! This module drives one revision turn end to end:
//! 1. Resolve the session (cache hit or durable restore)
//! 2. Increment the turn counter and check manual-end phrases
//! 3. Classify the turn into a pedagogical stage
//! 4. Run the matching stage handler (content fetch + text generation)
//! 5. Persist the turn record and updated session snapshot
//! 6. Merge session metadata into the structured reply
//!
//! Collaborator faults never abort a continuation turn: content-store
//! faults degrade to empty results upstream, generator faults degrade to a
//! generic continuation here. The only hard error is an unknown session id.

mod engine;
mod handlers;
mod reply;

pub use engine::{EngineError, RevisionEngine};
pub use reply::{RevisionReply, SessionStats};

pub(crate) use reply::completion_percentage;
