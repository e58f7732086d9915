//! Configuration
//!
//! Typed configuration structures, a text loader for them, and binary
//! persistence in postcard format.

pub mod parse;
#[cfg(feature = "serde")]
pub mod store;
pub mod types;

pub use parse::parse_config;
pub use types::*;
