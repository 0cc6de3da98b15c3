//! chatmux: lifecycle manager for named chat-client sessions.
//!
//! Each session wraps one external messaging client that authenticates
//! through a one-time QR scan. The crate tracks sessions by name, mediates
//! the QR handshake exactly once per session, restores persisted sessions at
//! boot, and exposes the whole thing over HTTP/WebSocket.

pub mod client_management;
pub mod configuration;
pub mod dispatch;
pub mod error_handling;
pub mod handshake;
pub mod session_management;
pub mod storage;
pub mod web_interface;
