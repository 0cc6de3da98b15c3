use crate::client_management::types::ChatClient;
use crate::error_handling::types::SessionError;
use crate::session_management::session::{Session, SessionState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// A registered session together with its runtime attachments.
pub struct ActiveSession {
    pub session: Session,
    /// Exclusively owned client handle; `None` while construction is still
    /// in flight.
    pub client: Option<Arc<dyn ChatClient>>,
    /// Pump draining the client's event channel.
    pub event_task: Option<JoinHandle<()>>,
}

/// In-memory registry `name -> Session`; the single source of truth for
/// which sessions exist and how many are active.
///
/// Holds at most one record per name. A name becomes reusable only after the
/// prior record has been removed. The lock is only ever held for map access,
/// never across an await, so operations on different sessions cannot block
/// one another.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, ActiveSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a fresh `Initializing` record for `name`.
    ///
    /// The record starts without a client; the caller attaches one once
    /// construction finishes, or removes the record if it fails.
    pub fn create(&self, name: &str, resumed: bool) -> Result<(), SessionError> {
        let mut sessions = self.lock();
        if sessions.contains_key(name) {
            return Err(SessionError::Conflict(name.to_string()));
        }
        sessions.insert(
            name.to_string(),
            ActiveSession {
                session: Session::new(name, resumed),
                client: None,
                event_task: None,
            },
        );
        Ok(())
    }

    /// Attaches the constructed client and its event pump to `name`.
    pub fn attach_client(
        &self,
        name: &str,
        client: Arc<dyn ChatClient>,
        event_task: JoinHandle<()>,
    ) -> Result<(), SessionError> {
        let mut sessions = self.lock();
        let active = sessions
            .get_mut(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        active.client = Some(client);
        active.event_task = Some(event_task);
        Ok(())
    }

    /// Removes and returns the record for `name`. Idempotent; absent names
    /// are a no-op.
    pub fn remove(&self, name: &str) -> Option<ActiveSession> {
        self.lock().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Clones out the client handle for `name`, if one is attached.
    pub fn client(&self, name: &str) -> Option<Arc<dyn ChatClient>> {
        self.lock().get(name).and_then(|a| a.client.clone())
    }

    /// Snapshot of the session record for `name`.
    pub fn session(&self, name: &str) -> Option<Session> {
        self.lock().get(name).map(|a| a.session.clone())
    }

    pub fn state(&self, name: &str) -> Option<SessionState> {
        self.lock().get(name).map(|a| a.session.state)
    }

    pub fn set_state(&self, name: &str, state: SessionState) {
        if let Some(active) = self.lock().get_mut(name) {
            active.session.state = state;
        }
    }

    pub fn qr_delivered(&self, name: &str) -> Option<bool> {
        self.lock().get(name).map(|a| a.session.qr_delivered)
    }

    pub fn mark_qr_delivered(&self, name: &str) {
        if let Some(active) = self.lock().get_mut(name) {
            active.session.qr_delivered = true;
        }
    }

    /// Names of every registered session, sorted for stable output.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ActiveSession>> {
        // Lock poisoning only happens if a holder panicked; the map itself
        // is still coherent for these single-step operations.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_duplicates() {
        let store = SessionStore::new();
        store.create("alice", false).unwrap();
        assert!(matches!(
            store.create("alice", false),
            Err(SessionError::Conflict(_))
        ));
    }

    #[test]
    fn remove_is_idempotent_and_frees_the_name() {
        let store = SessionStore::new();
        store.create("alice", false).unwrap();
        assert!(store.remove("alice").is_some());
        assert!(store.remove("alice").is_none());
        store.create("alice", false).unwrap();
    }

    #[test]
    fn list_len_always_matches_count() {
        let store = SessionStore::new();
        assert_eq!(store.list().len(), store.count());
        store.create("alice", false).unwrap();
        store.create("bob", false).unwrap();
        assert_eq!(store.list().len(), store.count());
        store.remove("alice");
        assert_eq!(store.list().len(), store.count());
        assert_eq!(store.list(), vec!["bob"]);
    }

    #[test]
    fn qr_delivered_is_scoped_per_session() {
        let store = SessionStore::new();
        store.create("alice", false).unwrap();
        store.create("bob", false).unwrap();
        store.mark_qr_delivered("alice");
        assert_eq!(store.qr_delivered("alice"), Some(true));
        assert_eq!(store.qr_delivered("bob"), Some(false));
        assert_eq!(store.qr_delivered("carol"), None);
    }

    #[test]
    fn state_transitions_are_recorded() {
        let store = SessionStore::new();
        store.create("alice", false).unwrap();
        assert_eq!(store.state("alice"), Some(SessionState::Initializing));
        store.set_state("alice", SessionState::AwaitingScan);
        store.set_state("alice", SessionState::Authenticated);
        assert_eq!(store.state("alice"), Some(SessionState::Authenticated));
    }

    #[test]
    fn client_is_absent_until_attached() {
        let store = SessionStore::new();
        store.create("alice", false).unwrap();
        assert!(store.client("alice").is_none());
    }
}
