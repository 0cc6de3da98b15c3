use crate::error_handling::types::HandshakeError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;

/// One QR image pushed to real-time subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct QrFrame {
    pub session: String,
    #[serde(rename = "dataUrl")]
    pub data_url: String,
}

/// Where rendered QR images go once per handshake attempt.
#[async_trait]
pub trait QrSink: Send + Sync {
    async fn deliver(&self, session: &str, png: &[u8]) -> Result<(), HandshakeError>;
}

/// Fans QR frames out to every WebSocket subscriber through a broadcast
/// channel. Frames carry the session name so subscribers can filter.
pub struct BroadcastSink {
    tx: broadcast::Sender<QrFrame>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        BroadcastSink { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QrFrame> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl QrSink for BroadcastSink {
    async fn deliver(&self, session: &str, png: &[u8]) -> Result<(), HandshakeError> {
        let frame = QrFrame {
            session: session.to_string(),
            data_url: format!("data:image/png;base64,{}", BASE64.encode(png)),
        };
        // No subscribers is not a failure; the snapshot endpoint still serves
        // the image.
        if self.tx.send(frame).is_err() {
            debug!("No QR subscribers connected for session {}", session);
        }
        Ok(())
    }
}
