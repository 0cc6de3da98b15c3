use crate::client_management::types::{ChatClient, ClientEvent, ClientFactory};
use crate::configuration::types::BridgeConfig;
use crate::error_handling::types::ClientError;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};

/// Capacity of the per-client event channel. QR codes are re-emitted every
/// few seconds at most, so a small buffer is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Line-delimited JSON messages the bridge prints on stdout.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum BridgeEvent {
    Qr {
        code: String,
    },
    Ready,
    Disconnected {
        #[serde(default)]
        reason: String,
    },
}

/// Commands written to the bridge's stdin, one JSON object per line.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum BridgeCommand<'a> {
    Send { to: &'a str, body: &'a str },
}

struct BridgeProcess {
    child: Child,
    stdin: ChildStdin,
}

/// [`ChatClient`] backed by an external bridge subprocess.
///
/// One process per session. The bridge owns the real messaging protocol and
/// its browser automation; this side only speaks line-delimited JSON with it
/// and forwards `qr`/`ready`/`disconnected` events onto the session's channel.
pub struct BridgeClient {
    session_name: String,
    config: BridgeConfig,
    credential_dir: PathBuf,
    process: Mutex<Option<BridgeProcess>>,
    events: mpsc::Sender<ClientEvent>,
}

impl BridgeClient {
    fn new(
        session_name: &str,
        config: BridgeConfig,
        credential_dir: &Path,
        events: mpsc::Sender<ClientEvent>,
    ) -> Self {
        BridgeClient {
            session_name: session_name.to_string(),
            config,
            credential_dir: credential_dir.to_path_buf(),
            process: Mutex::new(None),
            events,
        }
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg("--session")
            .arg(&self.session_name)
            .arg("--auth-dir")
            .arg(&self.credential_dir);
        if self.config.headless {
            cmd.arg("--headless");
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Drains bridge stdout, translating protocol lines into client events.
    /// Ends when the bridge closes stdout; a clean end without `disconnected`
    /// is reported as one.
    async fn pump_stdout(
        session_name: String,
        stdout: tokio::process::ChildStdout,
        events: mpsc::Sender<ClientEvent>,
    ) {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<BridgeEvent>(line) {
                        Ok(BridgeEvent::Qr { code }) => {
                            debug!("Bridge for {} emitted a QR code", session_name);
                            if events.send(ClientEvent::Qr(code)).await.is_err() {
                                break;
                            }
                        }
                        Ok(BridgeEvent::Ready) => {
                            info!("Bridge for {} reported ready", session_name);
                            if events.send(ClientEvent::Ready).await.is_err() {
                                break;
                            }
                        }
                        Ok(BridgeEvent::Disconnected { reason }) => {
                            warn!("Bridge for {} disconnected: {}", session_name, reason);
                            let _ = events.send(ClientEvent::Disconnected(reason)).await;
                            break;
                        }
                        Err(e) => {
                            warn!(
                                "Unparseable line from bridge for {}: {} ({})",
                                session_name, line, e
                            );
                        }
                    }
                }
                Ok(None) => {
                    let _ = events
                        .send(ClientEvent::Disconnected("bridge exited".to_string()))
                        .await;
                    break;
                }
                Err(e) => {
                    warn!("Read error from bridge for {}: {}", session_name, e);
                    let _ = events.send(ClientEvent::Disconnected(e.to_string())).await;
                    break;
                }
            }
        }
    }

    async fn pump_stderr(session_name: String, stderr: tokio::process::ChildStderr) {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("bridge[{}]: {}", session_name, line);
        }
    }
}

#[async_trait]
impl ChatClient for BridgeClient {
    async fn initialize(&self) -> Result<(), ClientError> {
        let mut guard = self.process.lock().await;
        if guard.is_some() {
            return Err(ClientError::SpawnFailed(format!(
                "bridge for {} already running",
                self.session_name
            )));
        }

        info!(
            "Spawning bridge {} for session {}",
            self.config.command, self.session_name
        );
        let mut child = self
            .build_command()
            .spawn()
            .map_err(|e| ClientError::SpawnFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::SpawnFailed("bridge stdin not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::SpawnFailed("bridge stdout not piped".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(Self::pump_stderr(self.session_name.clone(), stderr));
        }
        tokio::spawn(Self::pump_stdout(
            self.session_name.clone(),
            stdout,
            self.events.clone(),
        ));

        *guard = Some(BridgeProcess { child, stdin });
        Ok(())
    }

    async fn destroy(&self) -> Result<(), ClientError> {
        let mut guard = self.process.lock().await;
        if let Some(mut process) = guard.take() {
            info!("Stopping bridge for session {}", self.session_name);
            // Closing stdin asks the bridge to shut down on its own.
            drop(process.stdin);
            if let Err(e) = process.child.kill().await {
                warn!("Failed to kill bridge for {}: {}", self.session_name, e);
            }
            match process.child.wait().await {
                Ok(status) => debug!(
                    "Bridge for {} exited with {}",
                    self.session_name, status
                ),
                Err(e) => warn!("Failed to reap bridge for {}: {}", self.session_name, e),
            }
        }
        Ok(())
    }

    async fn send_message(&self, addr: &str, body: &str) -> Result<(), ClientError> {
        let mut guard = self.process.lock().await;
        let process = guard.as_mut().ok_or(ClientError::NotRunning)?;

        let command = BridgeCommand::Send { to: addr, body };
        let mut line = serde_json::to_string(&command)
            .map_err(|e| ClientError::ProtocolError(e.to_string()))?;
        line.push('\n');
        process
            .stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ClientError::SendFailed(e.to_string()))?;
        process
            .stdin
            .flush()
            .await
            .map_err(|e| ClientError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

/// Factory spawning one [`BridgeClient`] per session.
pub struct BridgeClientFactory {
    config: BridgeConfig,
}

impl BridgeClientFactory {
    pub fn new(config: BridgeConfig) -> Self {
        BridgeClientFactory { config }
    }
}

#[async_trait]
impl ClientFactory for BridgeClientFactory {
    async fn create(
        &self,
        session_name: &str,
        credential_dir: &Path,
    ) -> Result<(Arc<dyn ChatClient>, mpsc::Receiver<ClientEvent>), ClientError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let client = BridgeClient::new(session_name, self.config.clone(), credential_dir, tx);
        Ok((Arc::new(client), rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_events_parse() {
        let qr: BridgeEvent = serde_json::from_str(r#"{"event":"qr","code":"2@abc"}"#).unwrap();
        assert!(matches!(qr, BridgeEvent::Qr { code } if code == "2@abc"));

        let ready: BridgeEvent = serde_json::from_str(r#"{"event":"ready"}"#).unwrap();
        assert!(matches!(ready, BridgeEvent::Ready));

        let gone: BridgeEvent = serde_json::from_str(r#"{"event":"disconnected"}"#).unwrap();
        assert!(matches!(gone, BridgeEvent::Disconnected { reason } if reason.is_empty()));
    }

    #[test]
    fn send_command_serializes() {
        let command = BridgeCommand::Send {
            to: "123@c.us",
            body: "hello",
        };
        assert_eq!(
            serde_json::to_string(&command).unwrap(),
            r#"{"action":"send","to":"123@c.us","body":"hello"}"#
        );
    }

    #[tokio::test]
    async fn send_before_initialize_fails() {
        let dir = tempfile::tempdir().unwrap();
        let factory = BridgeClientFactory::new(BridgeConfig::default());
        let (client, _events) = factory.create("alice", dir.path()).await.unwrap();
        assert!(matches!(
            client.send_message("123@c.us", "hi").await,
            Err(ClientError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn destroy_without_process_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let factory = BridgeClientFactory::new(BridgeConfig::default());
        let (client, _events) = factory.create("alice", dir.path()).await.unwrap();
        client.destroy().await.unwrap();
        client.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_with_missing_command_reports_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig {
            command: String::from("definitely-not-a-real-binary-5f2c"),
            ..BridgeConfig::default()
        };
        let factory = BridgeClientFactory::new(config);
        let (client, _events) = factory.create("alice", dir.path()).await.unwrap();
        assert!(matches!(
            client.initialize().await,
            Err(ClientError::SpawnFailed(_))
        ));
    }

    #[tokio::test]
    async fn real_bridge_round_trip() {
        // `cat` never emits protocol lines, but it exercises spawn, stdin
        // writes and teardown against a real child process. `sh -c` swallows
        // the per-session arguments the client appends.
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig {
            command: String::from("sh"),
            args: vec![String::from("-c"), String::from("cat")],
            headless: false,
        };
        let factory = BridgeClientFactory::new(config);
        let (client, mut events) = factory.create("alice", dir.path()).await.unwrap();

        client.initialize().await.unwrap();
        client.send_message("123@c.us", "hi").await.unwrap();
        client.destroy().await.unwrap();

        // After teardown the pump reports the bridge as gone.
        let event = events.recv().await;
        assert!(matches!(event, Some(ClientEvent::Disconnected(_)) | None));
    }
}
