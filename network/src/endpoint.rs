//! Endpoint normalisation.

use crate::NetworkError;

/// Port used when the configured endpoint does not name one.
pub const DEFAULT_PORT: u16 = 443;

/// Append [`DEFAULT_PORT`] to an address that has no port.
///
/// Accepts `host`, `host:port`, `[v6]`, `[v6]:port` and bare IPv6 literals.
pub fn normalize_endpoint(addr: &str) -> Result<String, NetworkError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(NetworkError::InvalidEndpoint(addr.to_string()));
    }

    if let Some(rest) = addr.strip_prefix('[') {
        let Some((host, tail)) = rest.split_once(']') else {
            return Err(NetworkError::InvalidEndpoint(addr.to_string()));
        };
        if host.is_empty() {
            return Err(NetworkError::InvalidEndpoint(addr.to_string()));
        }
        return match tail {
            "" => Ok(format!("[{host}]:{DEFAULT_PORT}")),
            _ => match tail.strip_prefix(':') {
                Some(port) if valid_port(port) => Ok(addr.to_string()),
                _ => Err(NetworkError::InvalidEndpoint(addr.to_string())),
            },
        };
    }

    match addr.matches(':').count() {
        0 => Ok(format!("{addr}:{DEFAULT_PORT}")),
        1 => match addr.split_once(':') {
            Some((host, port)) if !host.is_empty() && valid_port(port) => Ok(addr.to_string()),
            _ => Err(NetworkError::InvalidEndpoint(addr.to_string())),
        },
        // Bare IPv6 literal.
        _ => Ok(format!("[{addr}]:{DEFAULT_PORT}")),
    }
}

fn valid_port(port: &str) -> bool {
    port.parse::<u16>().is_ok()
}
