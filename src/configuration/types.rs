use serde::Deserialize;

/// How QR frames pushed over the real-time channel are scoped.
///
/// `Global` mirrors the historical behavior of broadcasting every session's
/// QR to every subscriber. `PerSession` requires a subscriber to name the
/// session it watches and only delivers that session's frames.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryScope {
    Global,
    PerSession,
}

/// Settings for rendering handshake codes into images.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Edge length of the rendered square raster, in pixels.
    pub width: u32,
    pub delivery_scope: DeliveryScope,
}

impl Default for QrConfig {
    fn default() -> Self {
        QrConfig {
            width: 100,
            delivery_scope: DeliveryScope::Global,
        }
    }
}

/// External bridge process that speaks the actual messaging protocol.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Command spawned once per session.
    pub command: String,
    /// Extra arguments appended before the per-session ones.
    pub args: Vec<String>,
    /// Run the bridge's embedded browser without a visible window.
    pub headless: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            command: String::from("chatmux-bridge"),
            args: Vec::new(),
            headless: true,
        }
    }
}
