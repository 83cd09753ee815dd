//! Synchronous request/response primitive over the open transport
//!
//! One command goes out as a single encoded line; `exec` then awaits exactly
//! one reply line, bounded by the configured timeout. `exec_no_reply` is the
//! fire-and-forget variant for triggers whose result is irrelevant (the
//! board sends nothing back for those, so the reply stream stays aligned).
//!
//! The channel takes `&mut self` everywhere: exactly one caller drives the
//! transport at a time, which is the whole mutual-exclusion discipline the
//! single-owner session needs.
//!
//! A timed-out wait does not abandon the pairing: the reply is still owed,
//! and whenever it eventually lands it must not be served as the answer to
//! a later command. The channel counts owed replies and discards one line
//! per debt before reading a fresh reply.

use std::io;
use std::time::Duration;

use pico_protocol::{normalize_reply, EncodeCommand, HostCommand};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{trace, warn};

use crate::error::LinkError;

/// Request/response channel over an open byte stream
///
/// Generic over the I/O type: real sessions use a serial stream, tests use
/// one end of `tokio::io::duplex()`.
pub struct CommandChannel<T> {
    io: T,
    /// Bytes received past the last consumed reply line
    pending: Vec<u8>,
    reply_timeout: Duration,
    /// Replies owed for waits that timed out; one line is discarded per
    /// debt before the next fresh reply is read
    stale_lines: usize,
}

impl<T> CommandChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a channel over an open stream
    pub fn new(io: T, reply_timeout: Duration) -> Self {
        Self {
            io,
            pending: Vec::with_capacity(256),
            reply_timeout,
            stale_lines: 0,
        }
    }

    /// Send a command and await its reply line
    ///
    /// Returns the normalized reply text. An empty string is a valid reply
    /// (the board answered with a bare line terminator), distinct from `"0"`.
    pub async fn exec(&mut self, cmd: &HostCommand) -> Result<String, LinkError> {
        self.send(cmd).await?;
        let reply = self.read_reply().await?;
        trace!("{:?} -> {:?}", cmd, reply);
        Ok(reply)
    }

    /// Send a command without consuming a reply
    pub async fn exec_no_reply(&mut self, cmd: &HostCommand) -> Result<(), LinkError> {
        trace!("{:?} (no reply awaited)", cmd);
        self.send(cmd).await
    }

    /// Write raw bytes to the transport (control-program upload path)
    pub(crate) async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.io.write_all(bytes).await?;
        self.io.flush().await?;
        Ok(())
    }

    async fn send(&mut self, cmd: &HostCommand) -> Result<(), LinkError> {
        let bytes = cmd.encode();
        self.send_raw(&bytes).await
    }

    /// Await one reply line, bounded by the reply timeout
    ///
    /// On timeout the reply stays owed: `stale_lines` is bumped so the late
    /// line gets discarded instead of answering a later command.
    async fn read_reply(&mut self) -> Result<String, LinkError> {
        let bound = self.reply_timeout;
        match timeout(bound, self.next_fresh_line()).await {
            Ok(result) => result,
            Err(_) => {
                self.stale_lines += 1;
                Err(LinkError::Timeout {
                    ms: bound.as_millis() as u64,
                })
            }
        }
    }

    /// Discard one line per owed reply, then read the fresh one
    async fn next_fresh_line(&mut self) -> Result<String, LinkError> {
        while self.stale_lines > 0 {
            let stale = self.read_line().await?;
            self.stale_lines -= 1;
            warn!("Discarding stale reply: {:?}", stale);
        }
        self.read_line().await
    }

    /// Read until a line terminator shows up in the pending buffer
    async fn read_line(&mut self) -> Result<String, LinkError> {
        let mut buf = [0u8; 1024];
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(normalize_reply(&line));
            }

            let n = self.io.read(&mut buf).await?;
            if n == 0 {
                return Err(LinkError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed while awaiting reply",
                )));
            }
            self.pending.extend_from_slice(&buf[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pico_protocol::HostCommand;
    use tokio::io::AsyncWriteExt;

    fn fast_channel(io: tokio::io::DuplexStream) -> CommandChannel<tokio::io::DuplexStream> {
        CommandChannel::new(io, Duration::from_millis(100))
    }

    #[tokio::test]
    async fn exec_returns_normalized_reply() {
        let (host, mut device) = tokio::io::duplex(256);
        let mut channel = fast_channel(host);

        let echo = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let n = device.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"getLen()\r\n");
            device.write_all(b"17\r\n").await.unwrap();
        });

        let reply = channel.exec(&HostCommand::BufferLen).await.unwrap();
        assert_eq!(reply, "17");
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn empty_reply_is_distinct_from_zero() {
        let (host, mut device) = tokio::io::duplex(256);
        let mut channel = fast_channel(host);

        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            device.read(&mut buf).await.unwrap();
            device.write_all(b"\r\n").await.unwrap();
            device.read(&mut buf).await.unwrap();
            device.write_all(b"0\r\n").await.unwrap();
        });

        assert_eq!(channel.exec(&HostCommand::BufferLen).await.unwrap(), "");
        assert_eq!(channel.exec(&HostCommand::BufferLen).await.unwrap(), "0");
    }

    #[tokio::test]
    async fn missing_reply_times_out() {
        let (host, _device) = tokio::io::duplex(256);
        let mut channel = fast_channel(host);

        let err = channel.exec(&HostCommand::QueryEnded).await.unwrap_err();
        assert!(matches!(err, LinkError::Timeout { ms: 100 }));
    }

    #[tokio::test]
    async fn reply_split_across_reads_is_reassembled() {
        let (host, mut device) = tokio::io::duplex(256);
        let mut channel = fast_channel(host);

        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            device.read(&mut buf).await.unwrap();
            device.write_all(b"{1: 0").await.unwrap();
            device.flush().await.unwrap();
            device.write_all(b".5}\r\n").await.unwrap();
        });

        let reply = channel
            .exec(&HostCommand::FetchData { channels: vec![1] })
            .await
            .unwrap();
        assert_eq!(reply, "{1: 0.5}");
    }

    #[tokio::test]
    async fn exec_no_reply_leaves_stream_alone() {
        let (host, mut device) = tokio::io::duplex(256);
        let mut channel = fast_channel(host);

        channel
            .exec_no_reply(&HostCommand::Accumulate)
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let n = device.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"addToData()\r\n");
    }

    #[tokio::test]
    async fn late_reply_is_discarded_not_served_to_the_next_command() {
        let (host, mut device) = tokio::io::duplex(256);
        let mut channel = fast_channel(host);

        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            // Answer the first query well past the 100ms reply timeout
            device.read(&mut buf).await.unwrap();
            tokio::time::sleep(Duration::from_millis(150)).await;
            device.write_all(b"17\r\n").await.unwrap();
            // Answer the second query promptly
            device.read(&mut buf).await.unwrap();
            device.write_all(b"5\r\n").await.unwrap();
        });

        let err = channel.exec(&HostCommand::BufferLen).await.unwrap_err();
        assert!(err.is_reply_timeout());

        // The late "17" must be discarded, not paired with this query
        let reply = channel.exec(&HostCommand::BufferLen).await.unwrap();
        assert_eq!(reply, "5");
    }

    #[tokio::test]
    async fn closed_stream_is_a_transport_error() {
        let (host, device) = tokio::io::duplex(256);
        drop(device);
        let mut channel = fast_channel(host);

        let err = channel.exec(&HostCommand::BufferLen).await.unwrap_err();
        assert!(matches!(err, LinkError::Transport(_)));
    }
}
