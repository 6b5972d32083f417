//! V1 API handlers.

mod sessions;
mod topics;

pub use sessions::{
    continue_session, delete_session, get_session, get_turns, list_sessions, start_session,
};
pub use topics::list_topics;
