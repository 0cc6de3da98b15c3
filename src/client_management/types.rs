use crate::error_handling::types::ClientError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notifications a client emits while connecting and afterwards.
///
/// Delivered over a channel into the lifecycle manager's per-session pump so
/// ordering stays explicit instead of depending on inline callback timing.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A handshake code was (re-)emitted; repeats until scanned.
    Qr(String),
    /// The handshake completed and messages can be sent.
    Ready,
    /// The remote end dropped the client.
    Disconnected(String),
}

/// Opaque handle to one connecting/connected remote messaging client.
///
/// The actual protocol lives behind this trait; the lifecycle manager only
/// ever initializes, destroys and sends through it.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Requests initialization. Returns once initialization is underway;
    /// authentication completes out-of-band via [`ClientEvent`]s.
    async fn initialize(&self) -> Result<(), ClientError>;

    /// Tears the client down, releasing every resource it holds (connections,
    /// browser processes, file handles). Must be awaited before the same
    /// credential namespace is reused.
    async fn destroy(&self) -> Result<(), ClientError>;

    /// Sends `body` to `addr`, already formatted in the client's addressing
    /// scheme.
    async fn send_message(&self, addr: &str, body: &str) -> Result<(), ClientError>;
}

/// Builds clients bound to a per-session credential namespace.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(
        &self,
        session_name: &str,
        credential_dir: &Path,
    ) -> Result<(Arc<dyn ChatClient>, mpsc::Receiver<ClientEvent>), ClientError>;
}
