//! Nullable server: the far end of an in-memory connection.

use std::io;
use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

/// Buffer size of the in-memory pipe in each direction.
const PIPE_CAPACITY: usize = 64 * 1024;

/// How long [`ScriptedServer::recv`] waits for the client before giving up.
const RECV_TIMEOUT: Duration = Duration::from_secs(10);

pub type ClientReader = BufReader<ReadHalf<DuplexStream>>;
pub type ClientWriter = WriteHalf<DuplexStream>;

/// Plays the server side of a session: sends command lines and reads the
/// client's replies.
pub struct ScriptedServer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl ScriptedServer {
    /// Create a connected pair. The reader and writer go to the client
    /// under test.
    pub fn new() -> (Self, ClientReader, ClientWriter) {
        let (server, client) = tokio::io::duplex(PIPE_CAPACITY);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);
        let server = Self {
            lines: BufReader::new(server_read).lines(),
            writer: server_write,
        };
        (server, BufReader::new(client_read), client_write)
    }

    /// Send one command line; the terminator is added.
    pub async fn send(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Send raw bytes exactly as given.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }

    /// Next reply from the client, `None` once the client shut down its
    /// writer or dropped both of its halves.
    pub async fn recv(&mut self) -> io::Result<Option<String>> {
        tokio::time::timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "client did not reply"))?
    }

    /// Close the server's sending side; the client sees end of stream.
    pub async fn hang_up(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}
