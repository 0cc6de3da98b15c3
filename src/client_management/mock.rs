//! In-memory [`ChatClient`] for exercising the lifecycle manager and
//! dispatcher without a real bridge process.

use crate::client_management::types::{ChatClient, ClientEvent, ClientFactory};
use crate::error_handling::types::ClientError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub struct MockClient {
    pub session_name: String,
    pub credential_dir: PathBuf,
    pub initialized: AtomicBool,
    pub destroyed: AtomicBool,
    pub fail_send: AtomicBool,
    pub sent: Mutex<Vec<(String, String)>>,
    fail_initialize: bool,
    events: mpsc::Sender<ClientEvent>,
}

impl MockClient {
    pub async fn emit_qr(&self, code: &str) {
        let _ = self.events.send(ClientEvent::Qr(code.to_string())).await;
    }

    pub async fn emit_ready(&self) {
        let _ = self.events.send(ClientEvent::Ready).await;
    }

    pub async fn emit_disconnected(&self, reason: &str) {
        let _ = self
            .events
            .send(ClientEvent::Disconnected(reason.to_string()))
            .await;
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn initialize(&self) -> Result<(), ClientError> {
        if self.fail_initialize {
            return Err(ClientError::SpawnFailed(format!(
                "mock initialize failure for {}",
                self.session_name
            )));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn destroy(&self) -> Result<(), ClientError> {
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message(&self, addr: &str, body: &str) -> Result<(), ClientError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(ClientError::NotRunning);
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ClientError::SendFailed("mock send failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((addr.to_string(), body.to_string()));
        Ok(())
    }
}

/// Factory that remembers every client it built, keyed by session name, so
/// tests can drive events and inspect calls.
#[derive(Default)]
pub struct MockClientFactory {
    clients: Mutex<HashMap<String, Vec<Arc<MockClient>>>>,
    fail_initialize_for: Mutex<HashSet<String>>,
}

impl MockClientFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes `initialize` fail for every client later built for `name`.
    pub fn fail_initialize_for(&self, name: &str) {
        self.fail_initialize_for
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    /// Latest client built for `name`.
    pub fn client(&self, name: &str) -> Arc<MockClient> {
        self.clients.lock().unwrap()[name]
            .last()
            .cloned()
            .expect("no client built for session")
    }

    /// How many clients were ever built for `name`.
    pub fn build_count(&self, name: &str) -> usize {
        self.clients
            .lock()
            .unwrap()
            .get(name)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn create(
        &self,
        session_name: &str,
        credential_dir: &Path,
    ) -> Result<(Arc<dyn ChatClient>, mpsc::Receiver<ClientEvent>), ClientError> {
        let (tx, rx) = mpsc::channel(16);
        let fail_initialize = self
            .fail_initialize_for
            .lock()
            .unwrap()
            .contains(session_name);
        let client = Arc::new(MockClient {
            session_name: session_name.to_string(),
            credential_dir: credential_dir.to_path_buf(),
            initialized: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            fail_initialize,
            events: tx,
        });
        self.clients
            .lock()
            .unwrap()
            .entry(session_name.to_string())
            .or_default()
            .push(client.clone());
        Ok((client, rx))
    }
}
