use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid endpoint: {0:?}")]
    InvalidEndpoint(String),

    #[error("connecting to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    #[error("connection to {endpoint} failed: {source}")]
    ConnectionFailed {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
