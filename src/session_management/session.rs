use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of one named session.
///
/// `Initializing -> AwaitingScan -> Authenticated`, with `Destroyed`
/// reachable from any state via explicit teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Initializing,
    AwaitingScan,
    Authenticated,
    Destroyed,
}

/// A named, isolated chat-client session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique key, caller supplied, immutable for the session's lifetime.
    pub name: String,
    pub state: SessionState,
    /// Set once a QR image has been delivered for the current handshake
    /// attempt. Scoped to this session only.
    pub qr_delivered: bool,
    pub started_at: DateTime<Utc>,
    /// True when restored from persisted credentials at boot.
    pub resumed: bool,
}

impl Session {
    pub fn new(name: &str, resumed: bool) -> Self {
        Session {
            name: name.to_string(),
            state: SessionState::Initializing,
            qr_delivered: false,
            started_at: Utc::now(),
            resumed,
        }
    }
}
