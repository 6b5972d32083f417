//! Revaid is a tutoring backend that walks a student through a "revision
//! session" over a fixed topic corpus. Each turn is classified into a
//! pedagogical stage (recap, question, quiz, progress check) by an ordered
//! rule table, composed with stored content and a generated-text call, and
//! persisted so sessions survive restarts.
//!
//! Module map:
//! - [`revision`]: the session flow controller (stage handlers + lifecycle)
//! - [`session`]: session state, stage classification, registry, snapshots
//! - [`content`]: topic content access with a fail-open catalog
//! - [`store`]: durable snapshot + turn-log persistence
//! - [`llm`]: text generation providers
//! - [`server`] / [`handlers`]: the HTTP surface

pub mod api;
pub mod build_info;
pub mod config;
pub mod content;
pub mod handlers;
pub mod llm;
pub mod prompts;
pub mod revision;
pub mod server;
pub mod session;
pub mod store;
pub mod topics;
