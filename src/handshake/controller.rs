use crate::error_handling::types::HandshakeError;
use crate::handshake::delivery::QrSink;
use crate::handshake::qr_renderer::QrRenderer;
use crate::session_management::session::SessionState;
use crate::session_management::session_store::SessionStore;
use crate::storage::credential_store::CredentialStore;
use log::{debug, info, warn};
use std::sync::Arc;

/// Turns raw handshake codes into images and delivers each session's QR
/// exactly once per handshake attempt.
///
/// Clients re-emit their code every few seconds until it is scanned; repeats
/// after the first delivery are suppressed via the session's own
/// `qr_delivered` flag, so concurrently authenticating sessions never steal
/// each other's delivery.
pub struct QrHandshakeController {
    store: Arc<SessionStore>,
    credentials: Arc<CredentialStore>,
    renderer: QrRenderer,
    sinks: Vec<Arc<dyn QrSink>>,
}

impl QrHandshakeController {
    pub fn new(
        store: Arc<SessionStore>,
        credentials: Arc<CredentialStore>,
        renderer: QrRenderer,
        sinks: Vec<Arc<dyn QrSink>>,
    ) -> Self {
        QrHandshakeController {
            store,
            credentials,
            renderer,
            sinks,
        }
    }

    /// Handles one `qr` notification for `name`.
    ///
    /// Returns `Ok(true)` when an image was delivered, `Ok(false)` when the
    /// notification was suppressed (already delivered, already authenticated,
    /// or the session is gone). Render and snapshot failures leave the
    /// delivered flag unset so a restart can retry the handshake.
    pub async fn on_code(&self, name: &str, code: &str) -> Result<bool, HandshakeError> {
        match self.store.qr_delivered(name) {
            None => {
                warn!("Dropping QR code for unknown session {}", name);
                return Ok(false);
            }
            Some(true) => {
                info!("QR code already sent for {}, waiting for scan...", name);
                return Ok(false);
            }
            Some(false) => {}
        }
        if self.store.state(name) == Some(SessionState::Authenticated) {
            debug!("Session {} is already authenticated, ignoring QR", name);
            return Ok(false);
        }

        info!("QR code received for session {}", name);
        let png = self.renderer.render_png(code)?;
        self.credentials.save_qr_snapshot(name, &png)?;

        for sink in &self.sinks {
            sink.deliver(name, &png).await?;
        }

        self.store.mark_qr_delivered(name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::types::HandshakeError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records deliveries instead of pushing them anywhere.
    struct RecordingSink {
        delivered: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(RecordingSink {
                delivered: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn sessions(&self) -> Vec<String> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QrSink for RecordingSink {
        async fn deliver(&self, session: &str, _png: &[u8]) -> Result<(), HandshakeError> {
            if self.fail {
                return Err(HandshakeError::DeliveryFailed("sink closed".to_string()));
            }
            self.delivered.lock().unwrap().push(session.to_string());
            Ok(())
        }
    }

    fn controller(
        store: Arc<SessionStore>,
        sink: Arc<RecordingSink>,
    ) -> (tempfile::TempDir, QrHandshakeController) {
        let dir = tempfile::tempdir().unwrap();
        let credentials = Arc::new(CredentialStore::new(dir.path()).unwrap());
        let controller = QrHandshakeController::new(
            store,
            credentials,
            QrRenderer::new(100),
            vec![sink as Arc<dyn QrSink>],
        );
        (dir, controller)
    }

    #[tokio::test]
    async fn delivers_exactly_once_per_attempt() {
        let store = Arc::new(SessionStore::new());
        store.create("alice", false).unwrap();
        let sink = RecordingSink::new(false);
        let (_dir, controller) = controller(store.clone(), sink.clone());

        assert!(controller.on_code("alice", "2@first").await.unwrap());
        assert!(!controller.on_code("alice", "2@second").await.unwrap());
        assert_eq!(sink.sessions(), vec!["alice"]);
        assert_eq!(store.qr_delivered("alice"), Some(true));
    }

    #[tokio::test]
    async fn second_session_still_gets_its_own_qr() {
        let store = Arc::new(SessionStore::new());
        store.create("alice", false).unwrap();
        store.create("bob", false).unwrap();
        let sink = RecordingSink::new(false);
        let (_dir, controller) = controller(store.clone(), sink.clone());

        assert!(controller.on_code("alice", "2@a").await.unwrap());
        assert!(controller.on_code("bob", "2@b").await.unwrap());
        assert_eq!(sink.sessions(), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn unknown_session_is_dropped() {
        let store = Arc::new(SessionStore::new());
        let sink = RecordingSink::new(false);
        let (_dir, controller) = controller(store, sink.clone());

        assert!(!controller.on_code("ghost", "2@x").await.unwrap());
        assert!(sink.sessions().is_empty());
    }

    #[tokio::test]
    async fn authenticated_session_gets_no_delivery() {
        let store = Arc::new(SessionStore::new());
        store.create("alice", false).unwrap();
        store.set_state("alice", SessionState::Authenticated);
        let sink = RecordingSink::new(false);
        let (_dir, controller) = controller(store, sink.clone());

        assert!(!controller.on_code("alice", "2@x").await.unwrap());
        assert!(sink.sessions().is_empty());
    }

    #[tokio::test]
    async fn render_failure_leaves_flag_unset() {
        let store = Arc::new(SessionStore::new());
        store.create("alice", false).unwrap();
        let sink = RecordingSink::new(false);
        let (_dir, controller) = controller(store.clone(), sink.clone());

        assert!(controller.on_code("alice", "").await.is_err());
        assert_eq!(store.qr_delivered("alice"), Some(false));
        // A later valid code still delivers.
        assert!(controller.on_code("alice", "2@ok").await.unwrap());
    }

    #[tokio::test]
    async fn delivery_failure_leaves_flag_unset() {
        let store = Arc::new(SessionStore::new());
        store.create("alice", false).unwrap();
        let sink = RecordingSink::new(true);
        let (_dir, controller) = controller(store.clone(), sink);

        assert!(controller.on_code("alice", "2@x").await.is_err());
        assert_eq!(store.qr_delivered("alice"), Some(false));
    }

    #[tokio::test]
    async fn snapshot_is_persisted_on_delivery() {
        let store = Arc::new(SessionStore::new());
        store.create("alice", false).unwrap();
        let sink = RecordingSink::new(false);

        let dir = tempfile::tempdir().unwrap();
        let credentials = Arc::new(CredentialStore::new(dir.path()).unwrap());
        let controller = QrHandshakeController::new(
            store,
            credentials.clone(),
            QrRenderer::new(100),
            vec![sink as Arc<dyn QrSink>],
        );

        controller.on_code("alice", "2@x").await.unwrap();
        let png = credentials.load_qr_snapshot("alice").unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
