use super::types::{BridgeConfig, QrConfig};
use crate::error_handling::types::ConfigError;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Runtime configuration for the whole process.
///
/// Loaded from a TOML file; every field has a default so an empty file (or no
/// file at all) yields a runnable configuration.
///
/// # Fields Overview
///
/// - `bind_address`: address the web interface binds to
/// - `web_port`: port for the HTTP/WebSocket interface
/// - `sessions_dir`: root directory holding per-session credential
///   namespaces and QR snapshots
/// - `bridge`: external messaging-bridge process settings
/// - `qr`: QR rendering and delivery settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: String,
    pub web_port: u16,
    pub sessions_dir: PathBuf,
    pub bridge: BridgeConfig,
    pub qr: QrConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: String::from("0.0.0.0"),
            web_port: 3000,
            sessions_dir: PathBuf::from("sessions"),
            bridge: BridgeConfig::default(),
            qr: QrConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the rest of the system assumes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::BadBindAddress(format!(
                "{} is not a valid IP address",
                self.bind_address
            )));
        }

        // Below 21px a version-1 QR code cannot be rendered at one pixel per
        // module; above 1024 the PNG gets silly for a scan target.
        if self.qr.width < 21 || self.qr.width > 1024 {
            return Err(ConfigError::BadQrWidth(format!(
                "{} is outside the accepted 21..=1024 range",
                self.qr.width
            )));
        }

        if self.sessions_dir.exists() && !self.sessions_dir.is_dir() {
            return Err(ConfigError::DirectoryDoesNotExist(format!(
                "{} exists but is not a directory",
                self.sessions_dir.display()
            )));
        }

        if self.bridge.command.trim().is_empty() {
            return Err(ConfigError::TomlError(
                "bridge.command must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
