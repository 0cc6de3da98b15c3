use crate::client_management::types::{ClientEvent, ClientFactory};
use crate::error_handling::types::SessionError;
use crate::handshake::controller::QrHandshakeController;
use crate::session_management::session::{Session, SessionState};
use crate::session_management::session_store::SessionStore;
use crate::storage::credential_store::CredentialStore;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates, restarts, destroys and restores named sessions.
///
/// One manager serves every session in the process. Each session owns its
/// client exclusively; the manager serializes access through the store and
/// never lets two clients overlap on one credential namespace: a restart
/// awaits the old client's teardown before constructing the replacement.
///
/// # Fields Overview
///
/// - `store`: registry of live sessions, the single source of truth
/// - `credentials`: per-session credential namespaces on disk
/// - `factory`: builds one client handle per session
/// - `handshake`: renders and delivers QR codes once per attempt
pub struct SessionManager {
    store: Arc<SessionStore>,
    credentials: Arc<CredentialStore>,
    factory: Arc<dyn ClientFactory>,
    handshake: Arc<QrHandshakeController>,
}

impl SessionManager {
    pub fn new(
        store: Arc<SessionStore>,
        credentials: Arc<CredentialStore>,
        factory: Arc<dyn ClientFactory>,
        handshake: Arc<QrHandshakeController>,
    ) -> Self {
        SessionManager {
            store,
            credentials,
            factory,
            handshake,
        }
    }

    /// Starts a fresh session named `name`.
    ///
    /// Returns once the client's initialization has been requested; the QR
    /// handshake completes out-of-band and is observed through the delivery
    /// sinks. The returned string tells the caller to wait for the QR.
    pub async fn start_session(&self, name: &str) -> Result<String, SessionError> {
        let name = Self::validated(name)?;
        self.start_session_inner(name, false).await
    }

    /// Tears down any session named `name`, then starts a replacement.
    ///
    /// The old client's destroy is fully awaited first, and removing the old
    /// record resets the per-session QR-delivered flag, so the next handshake
    /// attempt delivers again.
    pub async fn restart_session(&self, name: &str) -> Result<String, SessionError> {
        let name = Self::validated(name)?;
        if self.teardown(name).await {
            info!("Session {} destroyed ahead of restart", name);
        }
        if let Err(e) = self.credentials.remove_qr_snapshot(name) {
            warn!("Could not drop stale QR snapshot for {}: {}", name, e);
        }
        self.start_session_inner(name, false).await
    }

    /// Destroys the session named `name` and removes it from the store.
    /// Credentials stay on disk so the session can be resumed later.
    pub async fn destroy_session(&self, name: &str) -> Result<(), SessionError> {
        let name = Self::validated(name)?;
        if !self.teardown(name).await {
            return Err(SessionError::NotFound(name.to_string()));
        }
        if let Err(e) = self.credentials.remove_qr_snapshot(name) {
            warn!("Could not drop stale QR snapshot for {}: {}", name, e);
        }
        Ok(())
    }

    /// Destroys the session and purges its credential namespace, forcing a
    /// fresh handshake on the next start.
    pub async fn logout_session(&self, name: &str) -> Result<(), SessionError> {
        self.destroy_session(name).await?;
        self.credentials.remove_namespace(name.trim())?;
        Ok(())
    }

    /// Restores every session with a persisted credential namespace.
    ///
    /// Run once at boot. A session that fails to initialize is logged and
    /// skipped; the rest keep loading. Returns how many came up.
    pub async fn load_existing_sessions(&self) -> usize {
        let names = match self.credentials.list_namespaces() {
            Ok(names) => names,
            Err(e) => {
                error!("Could not enumerate persisted sessions: {}", e);
                return 0;
            }
        };

        let mut loaded = 0;
        for name in names {
            if self.store.contains(&name) {
                continue;
            }
            match self.start_session_inner(&name, true).await {
                Ok(_) => {
                    info!("Session {} loaded and initialized.", name);
                    loaded += 1;
                }
                Err(e) => error!("Error initializing session {}: {}", name, e),
            }
        }
        loaded
    }

    /// Destroys every session, awaiting each teardown.
    pub async fn shutdown(&self) {
        for name in self.store.list() {
            if self.teardown(&name).await {
                info!("Session {} shut down", name);
            }
        }
    }

    pub fn active_sessions(&self) -> Vec<String> {
        self.store.list()
    }

    /// Current record for `name`, so callers polling for a QR can see an
    /// explicit pending state instead of inferring it from silence.
    pub fn session_status(&self, name: &str) -> Option<Session> {
        self.store.session(name.trim())
    }

    pub fn active_session_count(&self) -> usize {
        self.store.count()
    }

    fn validated(name: &str) -> Result<&str, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidName(
                "Session name is required.".to_string(),
            ));
        }
        CredentialStore::validate_name(name)
            .map_err(|e| SessionError::InvalidName(e.to_string()))?;
        Ok(name)
    }

    async fn start_session_inner(&self, name: &str, resumed: bool) -> Result<String, SessionError> {
        // Registering first makes the duplicate check atomic; the record is
        // rolled back below if construction fails.
        self.store.create(name, resumed)?;

        if let Err(e) = self.construct_and_initialize(name).await {
            error!("Session {} failed to start: {}", name, e);
            if let Some(mut active) = self.store.remove(name) {
                active.session.state = SessionState::Destroyed;
                if let Some(client) = active.client.take() {
                    if let Err(e) = client.destroy().await {
                        warn!("Error destroying client for {}: {}", name, e);
                    }
                }
                if let Some(task) = active.event_task.take() {
                    task.abort();
                }
            }
            return Err(e);
        }

        Ok(format!(
            "Account {} initialized, please wait for QR code.",
            name
        ))
    }

    async fn construct_and_initialize(&self, name: &str) -> Result<(), SessionError> {
        let credential_dir = self.credentials.namespace_dir(name)?;
        let (client, events) = self.factory.create(name, &credential_dir).await?;

        let pump = tokio::spawn(Self::run_session_events(
            self.store.clone(),
            self.handshake.clone(),
            name.to_string(),
            events,
        ));
        self.store.attach_client(name, client.clone(), pump)?;

        client
            .initialize()
            .await
            .map_err(|e| SessionError::InitializationFailed(e.to_string()))?;
        Ok(())
    }

    /// Removes the record for `name` and fully awaits its client's teardown.
    /// Returns whether a session existed.
    async fn teardown(&self, name: &str) -> bool {
        let Some(mut active) = self.store.remove(name) else {
            return false;
        };
        active.session.state = SessionState::Destroyed;
        if let Some(client) = active.client.take() {
            if let Err(e) = client.destroy().await {
                warn!("Error destroying client for {}: {}", name, e);
            }
        }
        if let Some(task) = active.event_task.take() {
            task.abort();
        }
        true
    }

    /// Per-session pump translating client events into state transitions and
    /// handshake deliveries. Ends when the client's channel closes.
    async fn run_session_events(
        store: Arc<SessionStore>,
        handshake: Arc<QrHandshakeController>,
        name: String,
        mut events: mpsc::Receiver<ClientEvent>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                ClientEvent::Qr(code) => {
                    if store.state(&name) == Some(SessionState::Initializing) {
                        store.set_state(&name, SessionState::AwaitingScan);
                    }
                    match handshake.on_code(&name, &code).await {
                        Ok(true) => info!("QR image delivered for session {}", name),
                        Ok(false) => {}
                        // The session stays in AwaitingScan; a restart
                        // retries the handshake.
                        Err(e) => error!("Error generating QR code for {}: {}", name, e),
                    }
                }
                ClientEvent::Ready => {
                    info!("Session {} authenticated", name);
                    store.set_state(&name, SessionState::Authenticated);
                }
                ClientEvent::Disconnected(reason) => {
                    warn!("Session {} disconnected: {}", name, reason);
                }
            }
        }
        debug!("Event pump for session {} ended", name);
    }
}
