//! Shared helpers used across zbot crates.

pub mod error;
pub mod types;

pub use error::FromMessage;
