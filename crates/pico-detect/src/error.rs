//! Error types for port discovery

use thiserror::Error;

/// Errors that can occur during discovery
#[derive(Debug, Error)]
pub enum DetectError {
    /// Discovery invoked on an unrecognized operating environment
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// Serial port error
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),
}
