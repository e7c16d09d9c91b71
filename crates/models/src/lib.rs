//! Records exchanged with the BrainJar REST API and persisted by the client.
//! - Pure data plus validation; no I/O.
//! - Shared by the service layer, data providers and the CLI.

pub mod errors;
pub mod message;
pub mod streak;
pub mod user;

pub use errors::ModelError;
pub use message::ChatMessage;
pub use streak::{StreakSnapshot, StreakStats};
pub use user::User;
