//! Persistence for the client session.
//!
//! The persisted layout is two string entries: an opaque bearer token under
//! [`TOKEN_KEY`] and a JSON-serialized user record under [`USER_KEY`].

pub mod json_map_store;
pub mod session_store;

pub use session_store::{JsonFileSessionStore, MemorySessionStore, SessionStore, TOKEN_KEY, USER_KEY};
