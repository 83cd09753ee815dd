//! Normalized host-to-board command representation
//!
//! Every request the host can make is a `HostCommand` variant; `encode`
//! renders the exact wire text. Building requests from typed values (rather
//! than interpolating caller strings) is what keeps the channel-list
//! serialization injection-free.
//!
//! # Wire format
//!
//! One plain-text line per request, CRLF terminated:
//!
//! - `addToData()` - trigger buffering of one reading (no reply consumed)
//! - `getLen()` - query buffer size, integer reply or empty
//! - `getData([1, 2])` - fetch buffered sample for the listed channels
//! - `getEnded()` - sentinel query, replies `END` when the sequence is over
//! - `getSpeed([1, 2])` - device-side timing report in milliseconds

use crate::channel::Channel;

/// Line terminator for requests and replies
pub const LINE_TERMINATOR: &str = "\r\n";

/// Trait for commands that can be encoded to wire bytes
pub trait EncodeCommand {
    /// Encode this command to its wire format
    fn encode(&self) -> Vec<u8>;
}

/// A remote procedure call the host can issue to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Trigger device-side buffering of one reading: `addToData()`
    Accumulate,

    /// Query the current buffer size: `getLen()`
    BufferLen,

    /// Fetch the buffered sample for the given channels: `getData([...])`
    FetchData { channels: Vec<Channel> },

    /// Query whether the device-signaled sequence has ended: `getEnded()`
    QueryEnded,

    /// Request the device-side processing time report: `getSpeed([...])`
    QuerySpeed { channels: Vec<Channel> },
}

impl HostCommand {
    /// Render the channel list in the board's expected form: `[1, 2, 3]`
    fn channel_list(channels: &[Channel]) -> String {
        let items: Vec<String> = channels.iter().map(|c| c.to_string()).collect();
        format!("[{}]", items.join(", "))
    }
}

impl EncodeCommand for HostCommand {
    fn encode(&self) -> Vec<u8> {
        let text = match self {
            HostCommand::Accumulate => "addToData()".to_string(),
            HostCommand::BufferLen => "getLen()".to_string(),
            HostCommand::FetchData { channels } => {
                format!("getData({})", Self::channel_list(channels))
            }
            HostCommand::QueryEnded => "getEnded()".to_string(),
            HostCommand::QuerySpeed { channels } => {
                format!("getSpeed({})", Self::channel_list(channels))
            }
        };
        format!("{}{}", text, LINE_TERMINATOR).into_bytes()
    }
}
