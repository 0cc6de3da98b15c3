//! Session lifecycle core.
//!
//! This module owns the named-session registry and the state machine around
//! each session's one-time QR handshake.
//!
//! Re-exports:
//! - [`SessionManager`]: create/restart/destroy/restore sessions.
//! - [`SessionStore`], [`ActiveSession`]: the registry.
//! - [`Session`], [`SessionState`]: the per-session record.

pub mod session;
pub mod session_manager;
pub mod session_store;

pub use session::{Session, SessionState};
pub use session_manager::SessionManager;
pub use session_store::{ActiveSession, SessionStore};
