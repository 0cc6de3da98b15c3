use crate::error_handling::types::{DispatchError, SessionError};
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[serde(default)]
    pub session_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartSessionQuery {
    #[serde(default)]
    pub session_name: String,
}

#[derive(Debug, Deserialize)]
pub struct QrSocketQuery {
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<String>,
}

/// Maps lifecycle errors onto an HTTP status plus user-facing message.
pub fn session_error_reply(err: &SessionError) -> (StatusCode, String) {
    match err {
        SessionError::InvalidName(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        SessionError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        SessionError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        SessionError::ClientError(_)
        | SessionError::StorageError(_)
        | SessionError::InitializationFailed(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// Maps dispatch errors onto an HTTP status plus user-facing message.
pub fn dispatch_error_reply(err: &DispatchError) -> (StatusCode, String) {
    match err {
        DispatchError::NoSuchSession(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DispatchError::NotAuthenticated(_) => (StatusCode::CONFLICT, err.to_string()),
        DispatchError::InvalidRecipient(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DispatchError::SendFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
