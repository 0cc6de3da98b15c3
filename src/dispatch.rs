//! Outbound message routing.

pub mod message_dispatcher;

pub use message_dispatcher::MessageDispatcher;
