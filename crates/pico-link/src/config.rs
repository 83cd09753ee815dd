//! Link configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the command channel and acquisition loop
///
/// Without the reply bound a wedged board blocks a command forever; without
/// the poll interval the recording loop busy-spins on the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Upper bound on waiting for any single command reply
    pub reply_timeout: Duration,
    /// Sleep between acquisition loop iterations
    pub poll_interval: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(20),
        }
    }
}
