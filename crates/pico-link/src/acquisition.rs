//! The recording state machine
//!
//! A run is either duration-bounded or sentinel-bounded; the two modes share
//! one per-iteration protocol:
//!
//! 1. fire-and-forget `addToData()` so the board buffers a reading
//! 2. `getLen()`; when the reported length exceeds the gather threshold,
//!    `getData(channels)` pulls the buffer and the decoded sample joins the
//!    log
//! 3. evaluate the termination condition for the active mode
//!
//! The loop is RUNNING from entry until its condition holds, then
//! TERMINATED; there are no intermediate states. Sentinel mode checks
//! `getEnded()` after the fetch step, so a final partial buffer is still
//! captured on the terminal iteration.
//!
//! Malformed replies and reply timeouts are missed samples, not fatal: a
//! multi-minute recording should survive one garbled line. Only transport
//! loss (or a failed write) ends the run with an error.

use std::time::Duration;

use pico_protocol::{is_ended, parse_len, Channel, ChannelSet, HostCommand, Sample};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::command_channel::CommandChannel;
use crate::error::LinkError;

/// Default gather threshold: pull once the board buffers more than this
pub const DEFAULT_GATHER: u32 = 10;

/// When a recording run stops
///
/// Exactly one mode per run; a caller cannot ask for a duration and a
/// sentinel at the same time.
#[derive(Debug, Clone)]
pub enum Termination {
    /// Stop once this much wall-clock time has elapsed since loop entry
    For(Duration),
    /// Stop when the board's `getEnded()` reply is the `END` marker
    UntilEnded,
}

/// Options for one recording run
#[derive(Debug, Clone)]
pub struct RecordingOptions {
    /// Channels to fetch on every buffer pull (duplicates legal, order kept)
    pub channels: Vec<Channel>,
    /// Buffer-length threshold above which the host pulls
    pub gather: u32,
    /// Termination mode
    pub termination: Termination,
    /// Cooperative cancellation flag, checked each iteration; a cancelled
    /// run returns the log collected so far
    pub cancel: Option<watch::Receiver<bool>>,
}

impl RecordingOptions {
    /// Duration-bounded run with the default gather threshold
    pub fn for_duration(channels: Vec<Channel>, interval: Duration) -> Self {
        Self {
            channels,
            gather: DEFAULT_GATHER,
            termination: Termination::For(interval),
            cancel: None,
        }
    }

    /// Sentinel-bounded run with the default gather threshold
    pub fn until_ended(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            gather: DEFAULT_GATHER,
            termination: Termination::UntilEnded,
            cancel: None,
        }
    }

    /// Override the gather threshold
    pub fn with_gather(mut self, gather: u32) -> Self {
        self.gather = gather;
        self
    }

    /// Attach a cancellation flag
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Run the acquisition loop and return the collected log
pub(crate) async fn run<T>(
    channel: &mut CommandChannel<T>,
    capability: &ChannelSet,
    opts: &RecordingOptions,
    poll_interval: Duration,
) -> Result<Vec<Sample>, LinkError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    // Fail fast, before anything reaches the wire
    capability.validate(&opts.channels)?;

    let started = Instant::now();
    let mut log: Vec<Sample> = Vec::new();
    info!(
        "Recording on channels {:?} (gather > {}, {:?})",
        opts.channels, opts.gather, opts.termination
    );

    loop {
        if let Some(cancel) = &opts.cancel {
            if *cancel.borrow() {
                info!(
                    "Recording cancelled after {:?}, keeping {} sample(s)",
                    started.elapsed(),
                    log.len()
                );
                return Ok(log);
            }
        }

        if let Termination::For(interval) = opts.termination {
            if started.elapsed() >= interval {
                break;
            }
        }

        channel.exec_no_reply(&HostCommand::Accumulate).await?;

        if poll_buffer_len(channel, opts.gather).await? {
            fetch_sample(channel, &opts.channels, &mut log).await?;
        }

        if matches!(opts.termination, Termination::UntilEnded)
            && query_ended(channel).await?
        {
            break;
        }

        tokio::time::sleep(poll_interval).await;
    }

    info!(
        "Recording finished: {} sample(s) in {:?}",
        log.len(),
        started.elapsed()
    );
    Ok(log)
}

/// Query the buffer length; true when it exceeds the gather threshold
///
/// An empty reply means "nothing to report" and never triggers a pull.
async fn poll_buffer_len<T>(
    channel: &mut CommandChannel<T>,
    gather: u32,
) -> Result<bool, LinkError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let reply = match channel.exec(&HostCommand::BufferLen).await {
        Ok(reply) => reply,
        Err(e) if e.is_reply_timeout() => {
            warn!("Length query missed: {}", e);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    match parse_len(&reply) {
        Ok(Some(len)) => Ok(len > gather),
        Ok(None) => Ok(false),
        Err(e) => {
            warn!("Ignoring malformed length reply: {}", e);
            Ok(false)
        }
    }
}

/// Pull the buffer and append the decoded sample to the log
///
/// A malformed sample is logged and dropped; the poll retries later.
async fn fetch_sample<T>(
    channel: &mut CommandChannel<T>,
    channels: &[Channel],
    log: &mut Vec<Sample>,
) -> Result<(), LinkError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let reply = match channel
        .exec(&HostCommand::FetchData {
            channels: channels.to_vec(),
        })
        .await
    {
        Ok(reply) => reply,
        Err(e) if e.is_reply_timeout() => {
            warn!("Buffer pull missed: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    match Sample::parse(&reply) {
        Ok(sample) => {
            debug!("Pulled sample {} ({} channel(s))", log.len(), sample.len());
            log.push(sample);
        }
        Err(e) => warn!("Discarding malformed sample: {}", e),
    }
    Ok(())
}

/// Check the sentinel; a missed reply counts as "not ended yet"
async fn query_ended<T>(channel: &mut CommandChannel<T>) -> Result<bool, LinkError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    match channel.exec(&HostCommand::QueryEnded).await {
        Ok(reply) => Ok(is_ended(&reply)),
        Err(e) if e.is_reply_timeout() => {
            warn!("Sentinel query missed: {}", e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
