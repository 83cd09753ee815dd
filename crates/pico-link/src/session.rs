//! Session lifecycle and the high-level device operations
//!
//! A [`DeviceSession`] starts disconnected; [`connect`](DeviceSession::connect)
//! opens the serial port (or [`attach`](DeviceSession::attach) wires an
//! arbitrary stream in tests), and the session owns that transport until
//! [`close`](DeviceSession::close) or drop. At most one transport per
//! session: a second `connect`/`attach` fails with
//! [`LinkError::AlreadyConnected`], and every operation on a disconnected
//! session fails with [`LinkError::NotConnected`] before touching the wire.

use std::path::Path;
use std::time::Duration;

use pico_protocol::{Channel, ChannelSet, HostCommand, Sample, LINE_TERMINATOR};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use crate::acquisition::{self, RecordingOptions};
use crate::command_channel::CommandChannel;
use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::speed::{self, SpeedReport};

/// Default serial baud rate for the board
pub const DEFAULT_BAUD: u32 = 115_200;

/// Raw-mode soft reboot byte, sent after a program upload so the board
/// starts executing it
const SOFT_REBOOT: u8 = 0x04;

/// An exclusive session with one board
pub struct DeviceSession<T> {
    channel: Option<CommandChannel<T>>,
    config: LinkConfig,
    channel_set: ChannelSet,
}

impl DeviceSession<SerialStream> {
    /// Open the named serial port
    pub fn connect(&mut self, port: &str, baud: u32) -> Result<(), LinkError> {
        if self.channel.is_some() {
            return Err(LinkError::AlreadyConnected);
        }
        let stream = tokio_serial::new(port, baud).open_native_async()?;
        info!("Connected to {} at {} baud", port, baud);
        self.channel = Some(CommandChannel::new(stream, self.config.reply_timeout));
        Ok(())
    }
}

impl<T> DeviceSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a disconnected session
    pub fn new(config: LinkConfig) -> Self {
        Self {
            channel: None,
            config,
            channel_set: ChannelSet::standard(),
        }
    }

    /// Wire an already-open byte stream into the session
    pub fn attach(&mut self, io: T) -> Result<(), LinkError> {
        if self.channel.is_some() {
            return Err(LinkError::AlreadyConnected);
        }
        self.channel = Some(CommandChannel::new(io, self.config.reply_timeout));
        Ok(())
    }

    /// Whether the session currently owns a transport
    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Close the session, releasing the transport
    ///
    /// Idempotent; dropping the session has the same effect.
    pub fn close(&mut self) {
        if self.channel.take().is_some() {
            info!("Session closed");
        }
    }

    fn channel_mut(&mut self) -> Result<&mut CommandChannel<T>, LinkError> {
        self.channel.as_mut().ok_or(LinkError::NotConnected)
    }

    /// Upload a control program to the board and start it
    ///
    /// The file contents go over the wire verbatim, followed by a raw-mode
    /// soft reboot so the board begins executing the program. Not
    /// transactional: a transport failure mid-upload leaves the board's
    /// state undefined.
    pub async fn run_file(&mut self, path: impl AsRef<Path>) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let path = path.as_ref();
        let program = tokio::fs::read(path).await?;
        debug!("Uploading {} ({} bytes)", path.display(), program.len());

        let channel = self.channel_mut()?;
        channel.send_raw(&program).await?;
        channel.send_raw(LINE_TERMINATOR.as_bytes()).await?;
        channel.send_raw(&[SOFT_REBOOT]).await?;
        info!("Started {}", path.display());
        Ok(())
    }

    /// Pull one sample immediately, bypassing the gather threshold
    ///
    /// Returns the sample together with the host-measured exchange time.
    pub async fn read_data(
        &mut self,
        channels: &[Channel],
    ) -> Result<(Sample, Duration), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        self.channel_set.validate(channels)?;
        let channel = self.channel_mut()?;

        let started = Instant::now();
        let reply = channel
            .exec(&HostCommand::FetchData {
                channels: channels.to_vec(),
            })
            .await?;
        let elapsed = started.elapsed();

        let sample = Sample::parse(&reply).map_err(pico_protocol::ProtocolError::from)?;
        debug!("Read {} channel(s) in {:?}", sample.len(), elapsed);
        Ok((sample, elapsed))
    }

    /// Run a recording loop and return the collected sample log
    pub async fn record(&mut self, opts: &RecordingOptions) -> Result<Vec<Sample>, LinkError> {
        let poll_interval = self.config.poll_interval;
        let channel_set = self.channel_set;
        let channel = self.channel_mut()?;
        acquisition::run(channel, &channel_set, opts, poll_interval).await
    }

    /// Probe command round-trip overhead against the given channels
    pub async fn measure_overhead(
        &mut self,
        channels: &[Channel],
    ) -> Result<SpeedReport, LinkError> {
        let channel_set = self.channel_set;
        let channel = self.channel_mut()?;
        speed::measure(channel, &channel_set, channels).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_disconnected() {
        let session: DeviceSession<tokio::io::DuplexStream> =
            DeviceSession::new(LinkConfig::default());
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn operations_fail_before_connect() {
        let mut session: DeviceSession<tokio::io::DuplexStream> =
            DeviceSession::new(LinkConfig::default());
        let err = session.read_data(&[1]).await.unwrap_err();
        assert!(matches!(err, LinkError::NotConnected));
    }

    #[tokio::test]
    async fn disconnected_wins_over_invalid_channels() {
        let mut session: DeviceSession<tokio::io::DuplexStream> =
            DeviceSession::new(LinkConfig::default());

        let err = session.read_data(&[42]).await.unwrap_err();
        assert!(matches!(err, LinkError::NotConnected));

        let opts = RecordingOptions::until_ended(vec![42]);
        let err = session.record(&opts).await.unwrap_err();
        assert!(matches!(err, LinkError::NotConnected));

        let err = session.measure_overhead(&[42]).await.unwrap_err();
        assert!(matches!(err, LinkError::NotConnected));
    }

    #[tokio::test]
    async fn attach_twice_is_rejected() {
        let (a, _b) = tokio::io::duplex(64);
        let (c, _d) = tokio::io::duplex(64);
        let mut session = DeviceSession::new(LinkConfig::default());
        session.attach(a).unwrap();
        let err = session.attach(c).unwrap_err();
        assert!(matches!(err, LinkError::AlreadyConnected));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_allows_reattach() {
        let (a, _b) = tokio::io::duplex(64);
        let (c, _d) = tokio::io::duplex(64);
        let mut session = DeviceSession::new(LinkConfig::default());
        session.attach(a).unwrap();
        assert!(session.is_connected());

        session.close();
        session.close();
        assert!(!session.is_connected());

        session.attach(c).unwrap();
        assert!(session.is_connected());
    }
}
