//! Sensor channel identifiers and the board capability set
//!
//! The board exposes a fixed set of addressable sensor inputs. The set is
//! decided at construction and never mutated afterwards; validation happens
//! host-side before any command reaches the wire.

use crate::error::ProtocolError;

/// An addressable sensor input slot on the board
pub type Channel = u8;

/// Highest channel identifier on the standard board
pub const MAX_CHANNEL: Channel = 9;

/// The fixed set of channels a board accepts
///
/// Duplicate channels in a request are legal (the board simply reads the
/// slot twice); validation only rejects identifiers outside the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSet {
    max: Channel,
}

impl ChannelSet {
    /// The standard board capability set: channels 0 through 9
    pub fn standard() -> Self {
        Self { max: MAX_CHANNEL }
    }

    /// Capability set for a board with channels `0..=max`
    pub fn with_max(max: Channel) -> Self {
        Self { max }
    }

    /// Check whether a single channel is in the set
    pub fn contains(&self, channel: Channel) -> bool {
        channel <= self.max
    }

    /// Validate a requested channel sequence
    ///
    /// Order and duplicates are preserved by the caller; this only checks
    /// membership and reports the first offending value.
    pub fn validate(&self, channels: &[Channel]) -> Result<(), ProtocolError> {
        match channels.iter().find(|&&c| !self.contains(c)) {
            Some(&channel) => Err(ProtocolError::InvalidChannel { channel }),
            None => Ok(()),
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::standard()
    }
}
