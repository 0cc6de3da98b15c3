use chatmux::client_management::bridge_client::BridgeClientFactory;
use chatmux::configuration::config::Config;
use chatmux::dispatch::message_dispatcher::MessageDispatcher;
use chatmux::handshake::controller::QrHandshakeController;
use chatmux::handshake::delivery::{BroadcastSink, QrSink};
use chatmux::handshake::qr_renderer::QrRenderer;
use chatmux::session_management::session_manager::SessionManager;
use chatmux::session_management::session_store::SessionStore;
use chatmux::storage::credential_store::CredentialStore;
use chatmux::web_interface::web_server::WebServer;
use clap::Parser;
use log::{error, info};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "chatmux")]
#[command(version)]
#[command(about = "Multi-session chat-client lifecycle manager")]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    config_file: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    let config = match &args.config_file {
        Some(path) => match Config::from_file(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("Unable to import configuration from file: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    info!("Configuration imported successfully");

    let bind_ip: IpAddr = match config.bind_address.parse() {
        Ok(ip) => ip,
        Err(_) => {
            error!("Invalid bind address {}", config.bind_address);
            std::process::exit(1);
        }
    };

    let credentials = match CredentialStore::new(&config.sessions_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Unable to open sessions directory: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(SessionStore::new());
    let qr_sink = Arc::new(BroadcastSink::new(32));
    let handshake = Arc::new(QrHandshakeController::new(
        store.clone(),
        credentials.clone(),
        QrRenderer::new(config.qr.width),
        vec![qr_sink.clone() as Arc<dyn QrSink>],
    ));
    let factory = Arc::new(BridgeClientFactory::new(config.bridge.clone()));
    let manager = Arc::new(SessionManager::new(
        store.clone(),
        credentials.clone(),
        factory,
        handshake,
    ));

    let restored = manager.load_existing_sessions().await;
    info!("Restored {} persisted session(s)", restored);

    let dispatcher = Arc::new(MessageDispatcher::new(store));
    let server = WebServer::new(
        manager.clone(),
        dispatcher,
        credentials,
        qr_sink,
        config.qr.delivery_scope,
    );

    let addr: SocketAddr = (bind_ip, config.web_port).into();
    tokio::select! {
        _ = server.start(addr) => {
            error!("Web server stopped unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down, destroying active sessions");
            manager.shutdown().await;
        }
    }
}
