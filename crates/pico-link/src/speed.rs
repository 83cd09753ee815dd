//! Round-trip speed probe

use std::time::Duration;

use pico_protocol::{parse_speed_ms, Channel, ChannelSet, HostCommand};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tracing::debug;

use crate::command_channel::CommandChannel;
use crate::error::LinkError;

/// Result of one speed probe
///
/// `round_trip` is measured on the host clock; `device_time` is what the
/// board reports spending on the request itself. The difference is the
/// transport and scheduling overhead a recording loop pays per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedReport {
    /// Wall-clock time from send to reply
    pub round_trip: Duration,
    /// Board-reported processing time
    pub device_time: Duration,
}

impl SpeedReport {
    /// Host-side overhead: round trip minus board processing time
    ///
    /// Saturates at zero when clock granularity makes the reported device
    /// time exceed the measured round trip.
    pub fn host_overhead(&self) -> Duration {
        self.round_trip.saturating_sub(self.device_time)
    }
}

/// Time one `getSpeed` exchange against the given channels
pub(crate) async fn measure<T>(
    channel: &mut CommandChannel<T>,
    capability: &ChannelSet,
    channels: &[Channel],
) -> Result<SpeedReport, LinkError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    capability.validate(channels)?;

    let started = Instant::now();
    let reply = channel
        .exec(&HostCommand::QuerySpeed {
            channels: channels.to_vec(),
        })
        .await?;
    let round_trip = started.elapsed();

    let device_ms = parse_speed_ms(&reply).map_err(pico_protocol::ProtocolError::from)?;
    let report = SpeedReport {
        round_trip,
        device_time: Duration::from_millis(device_ms),
    };
    debug!(
        "Speed probe: {:?} round trip, {:?} on the board",
        report.round_trip, report.device_time
    );
    Ok(report)
}
