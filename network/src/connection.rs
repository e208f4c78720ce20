//! TCP connection management.

use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::endpoint::normalize_endpoint;
use crate::NetworkError;

/// Dials one server endpoint.
#[derive(Clone, Debug)]
pub struct Connector {
    endpoint: String,
    connect_timeout: Duration,
}

impl Connector {
    /// `endpoint` is normalised; a missing port becomes `:443`.
    pub fn new(endpoint: &str, connect_timeout: Duration) -> Result<Self, NetworkError> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            connect_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn connect(&self) -> Result<Connection, NetworkError> {
        let stream = self.dial().await?;
        Ok(Connection {
            connector: self.clone(),
            stream,
        })
    }

    async fn dial(&self) -> Result<TcpStream, NetworkError> {
        debug!(endpoint = %self.endpoint, "dialing");
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.endpoint))
            .await
            .map_err(|_| NetworkError::ConnectTimeout {
                endpoint: self.endpoint.clone(),
                timeout: self.connect_timeout,
            })?
            .map_err(|source| NetworkError::ConnectionFailed {
                endpoint: self.endpoint.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        info!(endpoint = %self.endpoint, peer = ?stream.peer_addr().ok(), "connected");
        Ok(stream)
    }
}

/// An open connection to the server.
#[derive(Debug)]
pub struct Connection {
    connector: Connector,
    stream: TcpStream,
}

impl Connection {
    pub fn endpoint(&self) -> &str {
        self.connector.endpoint()
    }

    /// Borrow buffered read and write halves for one session.
    pub fn split(&mut self) -> (BufReader<ReadHalf<'_>>, WriteHalf<'_>) {
        let (read, write) = self.stream.split();
        (BufReader::new(read), write)
    }

    pub fn into_split(self) -> (BufReader<OwnedReadHalf>, OwnedWriteHalf) {
        let (read, write) = self.stream.into_split();
        (BufReader::new(read), write)
    }

    /// Drop the current stream and dial the same endpoint again.
    pub async fn reconnect(&mut self) -> Result<(), NetworkError> {
        let _ = self.stream.shutdown().await;
        self.stream = self.connector.dial().await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), NetworkError> {
        self.stream.shutdown().await?;
        debug!(endpoint = %self.connector.endpoint(), "connection closed");
        Ok(())
    }
}
