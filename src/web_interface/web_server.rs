use std::net::SocketAddr;
use std::sync::Arc;

use crate::configuration::types::DeliveryScope;
use crate::dispatch::message_dispatcher::MessageDispatcher;
use crate::handshake::delivery::BroadcastSink;
use crate::session_management::session_manager::SessionManager;
use crate::storage::credential_store::CredentialStore;
use crate::web_interface::routes;
use log::info;
use warp::Filter;

/// HTTP/WebSocket surface over the lifecycle manager.
pub struct WebServer {
    manager: Arc<SessionManager>,
    dispatcher: Arc<MessageDispatcher>,
    credentials: Arc<CredentialStore>,
    qr_sink: Arc<BroadcastSink>,
    delivery_scope: DeliveryScope,
}

impl WebServer {
    pub fn new(
        manager: Arc<SessionManager>,
        dispatcher: Arc<MessageDispatcher>,
        credentials: Arc<CredentialStore>,
        qr_sink: Arc<BroadcastSink>,
        delivery_scope: DeliveryScope,
    ) -> Self {
        WebServer {
            manager,
            dispatcher,
            credentials,
            qr_sink,
            delivery_scope,
        }
    }

    /// Serves until the process is stopped.
    pub async fn start(&self, addr: SocketAddr) {
        let api = routes::dashboard_route()
            .or(routes::start_session_route(self.manager.clone()))
            .or(routes::send_message_route(self.dispatcher.clone()))
            .or(routes::restart_session_route(self.manager.clone()))
            .or(routes::session_count_route(self.manager.clone()))
            .or(routes::session_list_route(self.manager.clone()))
            .or(routes::qr_snapshot_route(self.credentials.clone()))
            .or(routes::session_status_route(self.manager.clone()))
            .or(routes::logout_session_route(self.manager.clone()))
            .or(routes::qr_socket_route(
                self.qr_sink.clone(),
                self.delivery_scope,
            ));

        info!("Web interface listening on {}", addr);
        warp::serve(api).run(addr).await;
    }
}
