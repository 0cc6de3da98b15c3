//! Persistence for session credentials and QR snapshots.

pub mod credential_store;

pub use credential_store::CredentialStore;
