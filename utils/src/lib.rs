//! Shared utilities for the saltpow client.

pub mod format;
pub mod logging;

pub use format::{format_duration, format_hash_rate};
pub use logging::{init_logging, LogFormat};
