//! Client core for BrainJar: session management, the REST client, and the
//! streak and chat features built on top of them.
//! - `auth` owns who is logged in and broadcasts lifecycle events.
//! - `http` talks to the backend and expires the session on 401.
//! - `streak` turns stats into a calendar, level and milestones.

pub mod errors;
pub mod auth;
pub mod storage;
pub mod http;
pub mod streak;
pub mod provider;
pub mod chat;
pub mod context;
#[cfg(test)]
pub mod test_support;

pub use context::AppContext;
