use std::sync::Arc;

use crate::configuration::types::DeliveryScope;
use crate::dispatch::message_dispatcher::MessageDispatcher;
use crate::error_handling::types::StorageError;
use crate::handshake::delivery::BroadcastSink;
use crate::session_management::session_manager::SessionManager;
use crate::storage::credential_store::CredentialStore;
use crate::web_interface::types::{
    dispatch_error_reply, session_error_reply, ApiError, ApiMessage, CountResponse,
    QrSocketQuery, RestartSessionQuery, SendMessageRequest, SessionListResponse,
    StartSessionRequest,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::sync::broadcast;
use warp::ws::{Message, WebSocket};
use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).and_then(|| async move {
        let html = r#"<html><head><title>chatmux</title></head>
            <body><h1>chatmux is running</h1>
            <p>POST /start-session, then watch /qr_real for the QR image.</p></body></html>"#;
        Ok::<_, Rejection>(reply::html(html))
    })
}

/// POST /start-session
pub fn start_session_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("start-session")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and_then(move |request: StartSessionRequest| {
            let manager = manager.clone();
            async move {
                match manager.start_session(&request.session_name).await {
                    Ok(message) => Ok::<_, Rejection>(
                        reply::with_status(reply::json(&ApiMessage { message }), StatusCode::OK)
                            .into_response(),
                    ),
                    Err(e) => {
                        let (status, error) = session_error_reply(&e);
                        Ok(reply::with_status(reply::json(&ApiError { error }), status)
                            .into_response())
                    }
                }
            }
        })
}

/// POST /send-message
pub fn send_message_route(
    dispatcher: Arc<MessageDispatcher>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("send-message")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and_then(move |request: SendMessageRequest| {
            let dispatcher = dispatcher.clone();
            async move {
                // Rejected before any session lookup happens.
                if request.session_name.trim().is_empty() {
                    return Ok::<_, Rejection>(
                        reply::with_status(
                            reply::json(&ApiError {
                                error: "Session name is required.".to_string(),
                            }),
                            StatusCode::BAD_REQUEST,
                        )
                        .into_response(),
                    );
                }

                match dispatcher
                    .send_message(
                        request.session_name.trim(),
                        &request.phone_number,
                        &request.message,
                    )
                    .await
                {
                    Ok(()) => Ok(reply::with_status(
                        reply::json(&ApiMessage {
                            message: "Message sent successfully".to_string(),
                        }),
                        StatusCode::OK,
                    )
                    .into_response()),
                    Err(e) => {
                        let (status, error) = dispatch_error_reply(&e);
                        Ok(reply::with_status(reply::json(&ApiError { error }), status)
                            .into_response())
                    }
                }
            }
        })
}

/// GET /restart-session?sessionName=
pub fn restart_session_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("restart-session")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<RestartSessionQuery>())
        .and_then(move |query: RestartSessionQuery| {
            let manager = manager.clone();
            async move {
                match manager.restart_session(&query.session_name).await {
                    Ok(message) => Ok::<_, Rejection>(
                        reply::with_status(reply::json(&ApiMessage { message }), StatusCode::OK)
                            .into_response(),
                    ),
                    Err(e) => {
                        let (status, error) = session_error_reply(&e);
                        Ok(reply::with_status(reply::json(&ApiError { error }), status)
                            .into_response())
                    }
                }
            }
        })
}

/// GET /active-sessions/count
pub fn session_count_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("active-sessions" / "count")
        .and(warp::get())
        .and_then(move || {
            let manager = manager.clone();
            async move {
                Ok::<_, Rejection>(reply::json(&CountResponse {
                    count: manager.active_session_count(),
                }))
            }
        })
}

/// GET /active-sessions
pub fn session_list_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("active-sessions")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let manager = manager.clone();
            async move {
                Ok::<_, Rejection>(reply::json(&SessionListResponse {
                    sessions: manager.active_sessions(),
                }))
            }
        })
}

/// GET /sessions/:name/qr — last rendered QR snapshot, or 404 while the
/// session is still pending its first code.
pub fn qr_snapshot_route(
    credentials: Arc<CredentialStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("sessions" / String / "qr")
        .and(warp::get())
        .and_then(move |name: String| {
            let credentials = credentials.clone();
            async move {
                match credentials.load_qr_snapshot(&name) {
                    Ok(png) => Ok::<_, Rejection>(
                        reply::with_status(
                            reply::with_header(png, "Content-Type", "image/png"),
                            StatusCode::OK,
                        )
                        .into_response(),
                    ),
                    Err(StorageError::NotFound(_)) => Ok(reply::with_status(
                        reply::json(&ApiError {
                            error: format!("No QR code generated yet for session {}", name),
                        }),
                        StatusCode::NOT_FOUND,
                    )
                    .into_response()),
                    Err(e) => Ok(reply::with_status(
                        reply::json(&ApiError {
                            error: e.to_string(),
                        }),
                        StatusCode::BAD_REQUEST,
                    )
                    .into_response()),
                }
            }
        })
}

/// GET /sessions/:name — current session record, so callers can poll an
/// explicit state (e.g. still `initializing`) instead of waiting blind.
pub fn session_status_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("sessions" / String)
        .and(warp::get())
        .and_then(move |name: String| {
            let manager = manager.clone();
            async move {
                match manager.session_status(&name) {
                    Some(session) => Ok::<_, Rejection>(
                        reply::with_status(reply::json(&session), StatusCode::OK).into_response(),
                    ),
                    None => Ok(reply::with_status(
                        reply::json(&ApiError {
                            error: format!("Session {} not found", name),
                        }),
                        StatusCode::NOT_FOUND,
                    )
                    .into_response()),
                }
            }
        })
}

/// DELETE /sessions/:name — tear the session down and purge its credentials.
pub fn logout_session_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("sessions" / String)
        .and(warp::delete())
        .and_then(move |name: String| {
            let manager = manager.clone();
            async move {
                match manager.logout_session(&name).await {
                    Ok(()) => Ok::<_, Rejection>(
                        reply::with_status(
                            reply::json(&ApiMessage {
                                message: format!("Session {} destroyed", name),
                            }),
                            StatusCode::OK,
                        )
                        .into_response(),
                    ),
                    Err(e) => {
                        let (status, error) = session_error_reply(&e);
                        Ok(reply::with_status(reply::json(&ApiError { error }), status)
                            .into_response())
                    }
                }
            }
        })
}

/// GET /qr_real — WebSocket pushing QR frames as they are delivered.
///
/// In per-session scope the subscriber must pass `?session=<name>` and only
/// receives that session's frames; in global scope the filter is optional.
pub fn qr_socket_route(
    sink: Arc<BroadcastSink>,
    scope: DeliveryScope,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("qr_real")
        .and(warp::path::end())
        .and(warp::ws())
        .and(warp::query::<QrSocketQuery>())
        .map(move |ws: warp::ws::Ws, query: QrSocketQuery| {
            let sink = sink.clone();
            ws.on_upgrade(move |socket| qr_socket_session(socket, sink, scope, query.session))
        })
}

async fn qr_socket_session(
    socket: WebSocket,
    sink: Arc<BroadcastSink>,
    scope: DeliveryScope,
    filter: Option<String>,
) {
    let (mut tx, mut rx) = socket.split();

    if scope == DeliveryScope::PerSession && filter.is_none() {
        let error = serde_json::json!({
            "error": "session query parameter is required"
        });
        let _ = tx.send(Message::text(error.to_string())).await;
        let _ = tx.close().await;
        return;
    }

    let mut frames = sink.subscribe();
    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(frame) => {
                    if let Some(ref wanted) = filter {
                        if frame.session != *wanted {
                            continue;
                        }
                    }
                    let text = match serde_json::to_string(&frame) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Could not serialize QR frame: {}", e);
                            continue;
                        }
                    };
                    if tx.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("QR subscriber lagged, skipped {} frames", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = rx.next() => match message {
                Some(Ok(m)) if m.is_close() => break,
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }
    debug!("QR subscriber disconnected");
}
