//! Newline framing over async byte streams.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::ProtocolError;

/// Longest inbound line accepted, excluding the terminator.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Reads `\n`- or `\r\n`-terminated lines.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    ///
    /// A final line without a terminator is still returned. Lines that are
    /// not valid UTF-8 are rejected as malformed.
    pub async fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        self.buf.clear();
        // Room for the longest line plus a `\r\n` terminator.
        let limit = (MAX_LINE_LEN + 2) as u64;
        let read = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if read == 0 {
            return Ok(None);
        }

        let mut line = self.buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest.strip_suffix(b"\r").unwrap_or(rest);
        }
        if line.len() > MAX_LINE_LEN {
            return Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN });
        }

        match std::str::from_utf8(line) {
            Ok(line) => Ok(Some(line.to_string())),
            Err(e) => Err(ProtocolError::MalformedCommand(format!(
                "line is not valid UTF-8: {e}"
            ))),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes one record per line, flushing after each.
#[derive(Debug)]
pub struct LineWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn write_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        trace!(line, "sending");
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.write_all(b"\n").await?;
        self.inner.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.inner.shutdown().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
