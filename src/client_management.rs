//! Chat client boundary.
//!
//! The real messaging protocol lives outside this crate, behind the
//! [`ChatClient`] trait. The shipped implementation drives one external
//! bridge subprocess per session over line-delimited JSON.
//!
//! Re-exports:
//! - [`ChatClient`], [`ClientFactory`], [`ClientEvent`]: the seam the
//!   lifecycle manager programs against.
//! - [`BridgeClient`], [`BridgeClientFactory`]: the subprocess-backed
//!   implementation.

pub mod bridge_client;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use bridge_client::{BridgeClient, BridgeClientFactory};
pub use types::{ChatClient, ClientEvent, ClientFactory};
