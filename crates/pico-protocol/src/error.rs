//! Error types for protocol parsing and encoding

use thiserror::Error;

use crate::channel::Channel;

/// Errors that can occur while parsing reply text
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Reply does not match the expected frame shape
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Buffer length reply is not an integer
    #[error("invalid buffer length: {0:?}")]
    InvalidLength(String),

    /// A sample entry has a non-numeric channel key
    #[error("invalid channel key: {0:?}")]
    InvalidChannelKey(String),

    /// A sample entry has a non-numeric reading
    #[error("invalid reading: {0:?}")]
    InvalidReading(String),

    /// Speed reply is not an integer millisecond count
    #[error("invalid speed reply: {0:?}")]
    InvalidSpeed(String),
}

/// Higher-level protocol errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A requested channel is outside the board's capability set
    #[error("invalid channel: {channel}")]
    InvalidChannel { channel: Channel },
}
