//! Liveness probing of candidate ports
//!
//! A candidate counts as live when it can be opened; the handle is dropped
//! immediately. Ports held by another process or gone stale in the OS list
//! fail the probe and get excluded from discovery.

use std::time::Duration;

use tracing::debug;

/// Baud rate used for the open/close probe
pub const PROBE_BAUD: u32 = 115_200;

/// Try to open the port and immediately release it
pub fn probe_port(port_name: &str) -> bool {
    match serialport::new(port_name, PROBE_BAUD)
        .timeout(Duration::from_millis(100))
        .open()
    {
        Ok(_handle) => true,
        Err(e) => {
            debug!("Excluding {}: {}", port_name, e);
            false
        }
    }
}
