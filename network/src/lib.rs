//! Transport to the proof-of-work server.
//!
//! The protocol layer only needs an ordered byte stream; this crate dials it
//! over TCP with a connect timeout and can re-dial the same endpoint.

pub mod connection;
pub mod endpoint;
pub mod error;

pub use connection::{Connection, Connector};
pub use endpoint::{normalize_endpoint, DEFAULT_PORT};
pub use error::NetworkError;
