//! Decoded sensor samples and the sample wire grammar
//!
//! A `getData` reply carries one buffered reading event as a textual mapping
//! from channel identifier to reading:
//!
//! ```text
//! {1: 0.5, 2: 3.25}
//! ```
//!
//! `{}` is the empty sample. The grammar is parsed explicitly; reply text is
//! never evaluated as code.

use std::collections::BTreeMap;

use crate::channel::Channel;
use crate::error::ParseError;

/// One decoded reading event, mapping channels to values
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    readings: BTreeMap<Channel, f64>,
}

impl Sample {
    /// Create an empty sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading for a channel (a repeated channel keeps the latest)
    pub fn insert(&mut self, channel: Channel, value: f64) {
        self.readings.insert(channel, value);
    }

    /// Look up the reading for a channel
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.readings.get(&channel).copied()
    }

    /// Number of channels with a reading
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the sample carries no readings
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Channels present in this sample, ascending
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.readings.keys().copied()
    }

    /// Iterate over (channel, reading) pairs, ascending by channel
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        self.readings.iter().map(|(&c, &v)| (c, v))
    }

    /// Parse sample text: `{<ch>: <reading>, ...}` or `{}`
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let trimmed = text.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| ParseError::InvalidFrame(format!("not a mapping: {:?}", text)))?
            .trim();

        let mut sample = Sample::new();
        if inner.is_empty() {
            return Ok(sample);
        }

        for entry in inner.split(',') {
            let (key, value) = entry
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidFrame(format!("not a pair: {:?}", entry)))?;

            let channel = key
                .trim()
                .parse::<Channel>()
                .map_err(|_| ParseError::InvalidChannelKey(key.trim().to_string()))?;
            let reading = value
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidReading(value.trim().to_string()))?;

            sample.insert(channel, reading);
        }

        Ok(sample)
    }

    /// Encode to the wire grammar (used by the board simulator)
    pub fn encode(&self) -> String {
        let entries: Vec<String> = self
            .readings
            .iter()
            .map(|(c, v)| format!("{}: {}", c, v))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

impl FromIterator<(Channel, f64)> for Sample {
    fn from_iter<I: IntoIterator<Item = (Channel, f64)>>(iter: I) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}
