//! Auth module: domain, repository, events and the session manager.
//!
//! The [`SessionManager`] is the single owner of "who is logged in": it
//! restores the persisted session, runs login/register/logout against an
//! [`AuthRepository`], and broadcasts lifecycle transitions to listeners.

pub mod domain;
pub mod errors;
pub mod events;
pub mod repo;
pub mod repository;
pub mod service;

pub use domain::{AuthEvent, AuthEventKind, Session};
pub use errors::AuthError;
pub use events::{AuthEventBus, Subscription};
pub use repository::AuthRepository;
pub use service::SessionManager;
