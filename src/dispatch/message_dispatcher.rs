use crate::error_handling::types::DispatchError;
use crate::session_management::session::SessionState;
use crate::session_management::session_store::SessionStore;
use log::{debug, error};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Digits with an optional leading `+`; the bridge side expects bare digits.
fn recipient_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9]{5,15}$").expect("recipient pattern"))
}

/// Routes outbound messages to the right session's client.
///
/// Failures from the client are wrapped and surfaced to the caller, never
/// retried and never dropped; retry policy belongs upstream.
pub struct MessageDispatcher {
    store: Arc<SessionStore>,
}

impl MessageDispatcher {
    pub fn new(store: Arc<SessionStore>) -> Self {
        MessageDispatcher { store }
    }

    /// Sends `body` to `phone_number` through the session named `name`.
    pub async fn send_message(
        &self,
        name: &str,
        phone_number: &str,
        body: &str,
    ) -> Result<(), DispatchError> {
        let client = self
            .store
            .client(name)
            .ok_or_else(|| DispatchError::NoSuchSession(name.to_string()))?;

        if self.store.state(name) != Some(SessionState::Authenticated) {
            return Err(DispatchError::NotAuthenticated(name.to_string()));
        }

        let addr = Self::format_recipient(phone_number)?;
        debug!("Dispatching message from session {} to {}", name, addr);
        client.send_message(&addr, body).await.map_err(|e| {
            error!("Error sending message from session {}: {}", name, e);
            DispatchError::SendFailed(e)
        })
    }

    /// Validates a phone number and formats it into the bridge addressing
    /// scheme.
    pub fn format_recipient(phone_number: &str) -> Result<String, DispatchError> {
        let phone_number = phone_number.trim();
        if !recipient_pattern().is_match(phone_number) {
            return Err(DispatchError::InvalidRecipient(format!(
                "{} is not a phone number",
                phone_number
            )));
        }
        Ok(format!("{}@c.us", phone_number.trim_start_matches('+')))
    }
}
