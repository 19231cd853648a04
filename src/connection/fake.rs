//! Scripted stream double for protocol tests.
//!
//! `FakeStream` serves a pre-fed byte script to readers in order and
//! captures everything written. Scripts can be built from whole lines or
//! raw byte runs (for literal payloads), served all at once or one byte
//! at a time to exercise incremental lexing. TLS upgrades are counted
//! instead of negotiated so STARTTLS sequencing can be asserted.

use std::cmp::min;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::stream::TlsUpgrade;
use crate::Result;

/// In-memory scripted stream.
#[derive(Debug, Default)]
pub struct FakeStream {
    script: Vec<u8>,
    pos: usize,
    /// Everything the client wrote, in order.
    pub written: Vec<u8>,
    /// Number of times `upgrade_tls` was called.
    pub tls_upgrades: u32,
    chunk: usize,
    err_on_exhausted: bool,
    pending_on_exhausted: bool,
}

impl FakeStream {
    /// Creates a stream serving the given raw script.
    #[must_use]
    pub fn new(script: impl Into<Vec<u8>>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// Creates an empty stream; feed it with `line` and `raw`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a CRLF-terminated line to the script.
    #[must_use]
    pub fn line(mut self, line: &str) -> Self {
        self.script.extend_from_slice(line.as_bytes());
        self.script.extend_from_slice(b"\r\n");
        self
    }

    /// Appends raw bytes to the script (literal payloads).
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.script.extend_from_slice(bytes);
        self
    }

    /// Serves at most `n` bytes per read, to exercise resumption.
    #[must_use]
    pub const fn trickle(mut self, n: usize) -> Self {
        self.chunk = n;
        self
    }

    /// Fails reads with an I/O error once the script is exhausted,
    /// instead of reporting a clean EOF.
    #[must_use]
    pub const fn err_on_exhausted(mut self) -> Self {
        self.err_on_exhausted = true;
        self
    }

    /// Leaves reads pending once the script is exhausted, like a live
    /// socket with no data, instead of reporting EOF.
    #[must_use]
    pub const fn pending_on_exhausted(mut self) -> Self {
        self.pending_on_exhausted = true;
        self
    }

    /// Returns the captured writes as lossy UTF-8 for assertions.
    #[must_use]
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).to_string()
    }
}

impl AsyncRead for FakeStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.pos >= self.script.len() {
            if self.err_on_exhausted {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "scripted read failure",
                )));
            }
            if self.pending_on_exhausted {
                return Poll::Pending;
            }
            // Clean EOF.
            return Poll::Ready(Ok(()));
        }

        let available = self.script.len() - self.pos;
        let mut n = min(available, buf.remaining());
        if self.chunk > 0 {
            n = min(n, self.chunk);
        }
        let start = self.pos;
        buf.put_slice(&self.script[start..start + n]);
        self.pos += n;

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for FakeStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl TlsUpgrade for FakeStream {
    async fn upgrade_tls(mut self, _host: &str) -> Result<Self> {
        self.tls_upgrades += 1;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn serves_script_in_order() {
        let mut stream = FakeStream::empty().line("* OK ready").raw(b"tail");
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"* OK ready\r\ntail");
    }

    #[tokio::test]
    async fn trickle_serves_single_bytes() {
        let mut stream = FakeStream::new(b"abc".to_vec()).trickle(1);
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).await.unwrap(), 1);
        assert_eq!(stream.read(&mut buf).await.unwrap(), 1);
        assert_eq!(stream.read(&mut buf).await.unwrap(), 1);
        assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn captures_writes() {
        let mut stream = FakeStream::empty();
        stream.write_all(b"TAG1 NOOP\r\n").await.unwrap();
        assert_eq!(stream.written_str(), "TAG1 NOOP\r\n");
    }

    #[tokio::test]
    async fn scripted_error_after_exhaustion() {
        let mut stream = FakeStream::new(b"x".to_vec()).err_on_exhausted();
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).await.unwrap(), 1);
        assert!(stream.read(&mut buf).await.is_err());
    }

    #[tokio::test]
    async fn upgrade_is_counted() {
        let stream = FakeStream::empty();
        let stream = stream.upgrade_tls("example.com").await.unwrap();
        assert_eq!(stream.tls_upgrades, 1);
    }
}
