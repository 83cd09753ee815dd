//! Host-side link to the picolog sensor board
//!
//! [`DeviceSession`] owns one serial transport and exposes the board's
//! operations: uploading a control program, single-shot reads, bounded
//! recording runs, and the round-trip speed probe. All replies are bounded
//! by [`LinkConfig::reply_timeout`]; the recording loop paces itself with
//! [`LinkConfig::poll_interval`].
//!
//! Sessions are generic over the transport (`AsyncRead + AsyncWrite`), so
//! the whole crate can be exercised against an in-memory stream; see
//! `pico-sim`.

pub mod acquisition;
pub mod command_channel;
pub mod config;
pub mod error;
pub mod session;
pub mod speed;

pub use acquisition::{RecordingOptions, Termination, DEFAULT_GATHER};
pub use command_channel::CommandChannel;
pub use config::LinkConfig;
pub use error::LinkError;
pub use session::{DeviceSession, DEFAULT_BAUD};
pub use speed::SpeedReport;
