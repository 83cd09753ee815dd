//! Virtual sensor board
//!
//! A pure state machine speaking the board side of the wire protocol. It
//! buffers `addToData()` triggers, answers length queries (optionally from a
//! test script), serves encoded samples, and arms the end-of-sequence
//! sentinel after a configurable number of `getEnded()` polls.

use std::collections::{BTreeMap, VecDeque};

use pico_protocol::{Channel, Sample, END_MARKER};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reply the board gives to `getEnded()` while the sequence is running
const NOT_ENDED_REPLY: &str = "no";

/// Configuration for creating a virtual board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualBoardConfig {
    /// Display name/identifier
    pub id: String,
    /// Device-side processing time reported by `getSpeed()`, milliseconds
    pub speed_ms: u64,
    /// Number of `getEnded()` queries answered `no` before `END`
    /// (`None` means the sequence never ends)
    pub end_after_polls: Option<u32>,
}

impl Default for VirtualBoardConfig {
    fn default() -> Self {
        Self {
            id: "Virtual Board".to_string(),
            speed_ms: 1,
            end_after_polls: None,
        }
    }
}

/// A simulated sensor board that answers protocol-accurate reply lines
#[derive(Debug)]
pub struct VirtualBoard {
    id: String,
    /// Current reading per channel
    readings: BTreeMap<Channel, f64>,
    /// Readings buffered by `addToData()` and not yet pulled
    buffered: u32,
    /// Scripted `getLen()` replies; `None` answers from the live counter
    len_script: Option<VecDeque<String>>,
    speed_ms: u64,
    end_after_polls: Option<u32>,
    ended_polls: u32,
    accumulate_count: u32,
    pull_count: u32,
}

impl VirtualBoard {
    /// Create a board with default settings
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_config(VirtualBoardConfig {
            id: id.into(),
            ..VirtualBoardConfig::default()
        })
    }

    /// Create a board from configuration
    pub fn from_config(config: VirtualBoardConfig) -> Self {
        Self {
            id: config.id,
            readings: BTreeMap::new(),
            buffered: 0,
            len_script: None,
            speed_ms: config.speed_ms,
            end_after_polls: config.end_after_polls,
            ended_polls: 0,
            accumulate_count: 0,
            pull_count: 0,
        }
    }

    /// Board identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the current reading for a channel
    pub fn set_reading(&mut self, channel: Channel, value: f64) {
        self.readings.insert(channel, value);
    }

    /// Script the `getLen()` replies; once the script runs out every further
    /// query is answered with an empty line
    pub fn script_len_replies<I, S>(&mut self, replies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.len_script = Some(replies.into_iter().map(Into::into).collect());
    }

    /// Arm the sentinel: answer `END` after `polls` `getEnded()` queries
    pub fn end_after_polls(&mut self, polls: u32) {
        self.end_after_polls = Some(polls);
    }

    /// How many `addToData()` triggers arrived
    pub fn accumulate_count(&self) -> u32 {
        self.accumulate_count
    }

    /// How many `getData()` pulls were served
    pub fn pull_count(&self) -> u32 {
        self.pull_count
    }

    /// Handle one request line; `None` means no reply is sent
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line == "addToData()" {
            self.accumulate_count += 1;
            self.buffered += 1;
            return None;
        }
        if line == "getLen()" {
            return Some(self.len_reply());
        }
        if line == "getEnded()" {
            return Some(self.ended_reply());
        }
        if let Some(args) = strip_call(line, "getData") {
            let channels = parse_channel_list(args)?;
            return Some(self.serve_data(&channels));
        }
        if let Some(args) = strip_call(line, "getSpeed") {
            let _channels = parse_channel_list(args)?;
            return Some(self.speed_ms.to_string());
        }

        debug!("Board {} ignoring unknown request: {:?}", self.id, line);
        None
    }

    fn len_reply(&mut self) -> String {
        match &mut self.len_script {
            Some(script) => script.pop_front().unwrap_or_default(),
            None => self.buffered.to_string(),
        }
    }

    fn ended_reply(&mut self) -> String {
        self.ended_polls += 1;
        match self.end_after_polls {
            Some(polls) if self.ended_polls > polls => END_MARKER.to_string(),
            _ => NOT_ENDED_REPLY.to_string(),
        }
    }

    /// Encode the current readings for the requested channels and drain the
    /// buffer; an unset channel reads as zero
    fn serve_data(&mut self, channels: &[Channel]) -> String {
        let sample: Sample = channels
            .iter()
            .map(|&c| (c, self.readings.get(&c).copied().unwrap_or(0.0)))
            .collect();
        self.buffered = 0;
        self.pull_count += 1;
        sample.encode()
    }
}

/// Strip `name(...)` and return the argument text
fn strip_call<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

/// Parse the `[a, b, c]` channel-list literal
fn parse_channel_list(args: &str) -> Option<Vec<Channel>> {
    let inner = args.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    inner
        .split(',')
        .map(|item| item.trim().parse::<Channel>().ok())
        .collect()
}
