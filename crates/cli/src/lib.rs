//! Watchout CLI Library
//!
//! This crate provides the terminal front end for watchout: it parses the
//! command line, turns key presses into requests, and draws the status line
//! and captured output of each run.
//!
//! # Architecture
//!
//! - [`cli_args`]: Command-line argument parsing
//! - [`keymap`]: Keyboard bindings and the keyboard request source
//! - [`status`]: Status line layout and duration formatting
//! - [`terminal`]: Terminal presenter and raw/cooked mode switching
//!
//! # Examples
//!
//! ```bash
//! # Re-run on every save
//! watchout report.py
//!
//! # Only run when Enter is pressed
//! watchout --no-watch report.py
//!
//! # Keep the last output on screen while the next run happens
//! watchout --lazy --interpreter pypy3 report.py
//! ```

pub mod cli_args;
pub mod keymap;
pub mod status;
pub mod terminal;
