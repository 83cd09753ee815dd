//! Serial Port Discovery for the picolog board
//!
//! This crate enumerates candidate serial ports on the host and verifies
//! each one is currently openable (opened and immediately closed as a
//! liveness probe). Candidates that fail the probe are excluded, not
//! errors; the report carries the exclusion count.
//!
//! # Example
//!
//! ```rust,no_run
//! use pico_detect::PortScanner;
//!
//! let scanner = PortScanner::new();
//! let report = scanner.discover().unwrap();
//!
//! for port in &report.ports {
//!     println!("Found port: {}", port.port);
//! }
//! println!("{} candidate(s) failed the open probe", report.excluded);
//! ```

pub mod error;
pub mod probe;
pub mod scanner;

pub use error::DetectError;
pub use probe::{probe_port, PROBE_BAUD};
pub use scanner::{DiscoveryReport, PortScanner, ScannerConfig, SerialPortInfo};
