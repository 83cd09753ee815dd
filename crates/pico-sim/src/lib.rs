//! Sensor Board Simulation Library
//!
//! This crate provides a simulated picolog board for testing acquisition
//! logic without physical hardware:
//!
//! - **VirtualBoard**: a pure state machine speaking the board side of the
//!   wire protocol, with scriptable length replies and an armable sentinel
//! - **run_board_task**: serves a board over any async byte stream
//!
//! # Example
//!
//! ```rust
//! use pico_sim::VirtualBoard;
//!
//! let mut board = VirtualBoard::new("Bench rig");
//! board.set_reading(1, 0.5);
//! assert_eq!(board.handle_line("addToData()"), None);
//!
//! assert_eq!(board.handle_line("getLen()"), Some("1".to_string()));
//! assert_eq!(board.handle_line("getData([1])"), Some("{1: 0.5}".to_string()));
//! ```

pub mod board;
pub mod board_task;

pub use board::{VirtualBoard, VirtualBoardConfig};
pub use board_task::run_board_task;
