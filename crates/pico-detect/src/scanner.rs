//! Serial port scanner
//!
//! Enumerates candidate serial ports on the host and filters them down to
//! the ones that pass a liveness probe. Probe failures are swallowed per
//! candidate (best-effort discovery) but counted for observability.

use serialport::{available_ports, SerialPortType};
use tracing::{debug, info};

use crate::error::DetectError;
use crate::probe::probe_port;

/// Information about a candidate serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB product string
    pub product: Option<String>,
}

impl SerialPortInfo {
    /// Create from serialport crate's port info
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product.clone(),
            },
            _ => Self {
                port: name,
                vid: None,
                pid: None,
                product: None,
            },
        }
    }
}

/// Outcome of one discovery pass
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    /// Ports that passed the open/close liveness probe
    pub ports: Vec<SerialPortInfo>,
    /// Candidates excluded because they failed to open
    pub excluded: usize,
}

/// Serial port scanner configuration
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    /// Skip ports matching these patterns
    pub skip_patterns: Vec<String>,
}

/// Serial port scanner
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    /// Create a new scanner with default configuration
    pub fn new() -> Self {
        Self {
            config: ScannerConfig {
                skip_patterns: vec![
                    // Bluetooth ports on macOS
                    "Bluetooth".to_string(),
                    // Debug/logging ports
                    "debug".to_string(),
                ],
            },
        }
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Enumerate candidate ports and probe each for liveness
    ///
    /// Candidates that fail to open are excluded silently; the report
    /// carries the exclusion count so a suspicious scan can be diagnosed.
    pub fn discover(&self) -> Result<DiscoveryReport, DetectError> {
        check_platform_supported()?;

        info!("Enumerating serial ports...");
        let candidates =
            available_ports().map_err(|e| DetectError::EnumerationFailed(e.to_string()))?;

        let mut ports = Vec::new();
        let mut excluded = 0;
        for candidate in candidates {
            let info = SerialPortInfo::from_serialport(candidate.port_name, &candidate.port_type);
            if self.should_skip_port(&info) {
                debug!("Skipping {} (pattern match)", info.port);
                continue;
            }
            if probe_port(&info.port) {
                ports.push(info);
            } else {
                excluded += 1;
            }
        }

        if ports.is_empty() {
            info!("No openable serial ports found ({} excluded)", excluded);
        } else {
            info!("Found {} serial port(s), {} excluded", ports.len(), excluded);
            for port in &ports {
                let desc = port.product.as_deref().unwrap_or("Unknown");
                info!("  {} - {}", port.port, desc);
            }
        }

        Ok(DiscoveryReport { ports, excluded })
    }

    /// Check if a port should be skipped
    fn should_skip_port(&self, port: &SerialPortInfo) -> bool {
        self.config
            .skip_patterns
            .iter()
            .any(|pattern| port.port.contains(pattern))
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Refuse to scan on operating environments the port layout is unknown for
fn check_platform_supported() -> Result<(), DetectError> {
    match std::env::consts::OS {
        "windows" | "linux" | "macos" => Ok(()),
        other => Err(DetectError::UnsupportedPlatform(other.to_string())),
    }
}
