//! Process configuration.
//!
//! TOML-backed settings with defaults for every field, validated after parse.

pub mod config;
pub mod types;

pub use config::Config;
pub use types::{BridgeConfig, DeliveryScope, QrConfig};
