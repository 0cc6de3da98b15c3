//! QR handshake orchestration.
//!
//! A session's client emits its handshake code repeatedly until the code is
//! scanned. This module renders the code to an image, persists a snapshot,
//! pushes it through the configured sinks, and makes sure all of that happens
//! exactly once per session per handshake attempt.

pub mod controller;
pub mod delivery;
pub mod qr_renderer;

pub use controller::QrHandshakeController;
pub use delivery::{BroadcastSink, QrFrame, QrSink};
pub use qr_renderer::QrRenderer;
