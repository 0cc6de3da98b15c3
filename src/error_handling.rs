//! Error types for every subsystem.
//!
//! Each subsystem owns one enum; nesting is expressed through `From`
//! conversions so `?` composes across component boundaries.

pub mod types;

pub use types::*;
