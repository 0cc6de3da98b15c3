use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadBindAddress(String),
    BadQrWidth(String),
    DirectoryDoesNotExist(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadBindAddress(e) => write!(f, "Bind address error: {}", e),
            ConfigError::BadQrWidth(e) => write!(f, "QR width error: {}", e),
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum SessionError {
    InvalidName(String),
    Conflict(String),
    NotFound(String),
    ClientError(ClientError),
    StorageError(StorageError),
    InitializationFailed(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidName(e) => write!(f, "Invalid session name: {}", e),
            SessionError::Conflict(name) => write!(f, "Session {} already exists.", name),
            SessionError::NotFound(name) => write!(f, "Session {} not found", name),
            SessionError::ClientError(e) => write!(f, "Client error: {}", e),
            SessionError::StorageError(e) => write!(f, "Storage error: {}", e),
            SessionError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ClientError> for SessionError {
    fn from(err: ClientError) -> Self {
        SessionError::ClientError(err)
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::StorageError(err)
    }
}

#[derive(Debug)]
pub enum ClientError {
    SpawnFailed(String),
    IoError(std::io::Error),
    ProtocolError(String),
    NotRunning,
    SendFailed(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::SpawnFailed(e) => write!(f, "Client spawn failed: {}", e),
            ClientError::IoError(e) => write!(f, "Client IO error: {}", e),
            ClientError::ProtocolError(e) => write!(f, "Client protocol error: {}", e),
            ClientError::NotRunning => write!(f, "Client is not running"),
            ClientError::SendFailed(e) => write!(f, "Client send failed: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::IoError(err)
    }
}

#[derive(Debug)]
pub enum HandshakeError {
    RenderFailed(String),
    SnapshotFailed(StorageError),
    DeliveryFailed(String),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::RenderFailed(e) => write!(f, "QR rendering failed: {}", e),
            HandshakeError::SnapshotFailed(e) => write!(f, "QR snapshot failed: {}", e),
            HandshakeError::DeliveryFailed(e) => write!(f, "QR delivery failed: {}", e),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<StorageError> for HandshakeError {
    fn from(err: StorageError) -> Self {
        HandshakeError::SnapshotFailed(err)
    }
}

#[derive(Debug)]
pub enum DispatchError {
    NoSuchSession(String),
    NotAuthenticated(String),
    InvalidRecipient(String),
    SendFailed(ClientError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NoSuchSession(name) => {
                write!(
                    f,
                    "Client {} is not initialized. Please start a session.",
                    name
                )
            }
            DispatchError::NotAuthenticated(name) => {
                write!(f, "Session {} has not completed its QR handshake yet", name)
            }
            DispatchError::InvalidRecipient(e) => write!(f, "Invalid recipient: {}", e),
            DispatchError::SendFailed(e) => write!(f, "Failed to send message: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<ClientError> for DispatchError {
    fn from(err: ClientError) -> Self {
        DispatchError::SendFailed(err)
    }
}

#[derive(Debug)]
pub enum StorageError {
    IoError(std::io::Error),
    InvalidName(String),
    NotFound(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::IoError(e) => write!(f, "Storage IO error: {}", e),
            StorageError::InvalidName(e) => write!(f, "Invalid namespace name: {}", e),
            StorageError::NotFound(e) => write!(f, "Not found in storage: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}
