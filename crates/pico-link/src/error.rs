//! Error types for the device link

use thiserror::Error;

/// Errors that can occur on the device link
#[derive(Debug, Error)]
pub enum LinkError {
    /// An operation was attempted before `connect`
    #[error("not connected: call connect() before issuing commands")]
    NotConnected,

    /// `connect` was called on an already-open session
    #[error("session already connected")]
    AlreadyConnected,

    /// No reply arrived within the configured bound
    #[error("reply timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Underlying byte-stream failure during a command exchange
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Serial port open failure
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Protocol error (invalid channel, malformed reply)
    #[error("protocol error: {0}")]
    Protocol(#[from] pico_protocol::ProtocolError),
}

impl LinkError {
    /// Whether this failure is a missed-reply hiccup the acquisition loop
    /// may ride out, as opposed to an unrecoverable transport loss
    pub fn is_reply_timeout(&self) -> bool {
        matches!(self, LinkError::Timeout { .. })
    }
}
