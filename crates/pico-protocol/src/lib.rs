//! Sensor Board Control Protocol
//!
//! This crate defines the textual remote-procedure-call protocol spoken
//! between a host and the picolog sensor board over a line-oriented byte
//! stream:
//!
//! - **Requests** are single CRLF-terminated lines built by
//!   [`HostCommand::encode`] - never by string interpolation of caller data.
//! - **Replies** are single lines; [`reply`] normalizes them and parses the
//!   scalar forms (buffer length, sentinel marker, speed report). An empty
//!   reply is a valid result, distinct from a literal `0`.
//! - **Samples** use an explicit `{channel: reading, ...}` grammar decoded by
//!   [`Sample::parse`]; reply text is never executed.
//!
//! # Example
//!
//! ```rust
//! use pico_protocol::{ChannelSet, EncodeCommand, HostCommand, Sample};
//!
//! let channels = vec![1, 2];
//! ChannelSet::standard().validate(&channels).unwrap();
//!
//! let request = HostCommand::FetchData { channels };
//! assert_eq!(request.encode(), b"getData([1, 2])\r\n");
//!
//! let sample = Sample::parse("{1: 0.5, 2: 3.25}").unwrap();
//! assert_eq!(sample.get(2), Some(3.25));
//! ```

pub mod channel;
pub mod command;
pub mod error;
pub mod reply;
pub mod sample;

pub use channel::{Channel, ChannelSet, MAX_CHANNEL};
pub use command::{EncodeCommand, HostCommand, LINE_TERMINATOR};
pub use error::{ParseError, ProtocolError};
pub use reply::{is_ended, normalize_reply, parse_len, parse_speed_ms, END_MARKER};
pub use sample::Sample;
