//! Watchout Core Library
//!
//! This crate provides the run engine behind watchout, a tool that re-runs a
//! script whenever it changes (or on request), shows its real terminal
//! output, and keeps a browsable history of past runs.
//!
//! # Key Features
//!
//! - **PTY Execution**: Runs the target in a pseudo-terminal so colors and prompts survive
//! - **Live Mirroring**: Streams output to the operator while capturing it
//! - **Run History**: Deduplicates consecutive identical runs and tracks a display cursor
//! - **File Watching**: Turns bursts of changes to the target into single run requests
//! - **Orchestration**: Serializes requests from all sources, one run at a time
//!
//! # Examples
//!
//! Running a script once in a pseudo-terminal:
//!
//! ```no_run
//! use watchout_core::config::RunCommand;
//! use watchout_core::execution::{Executor, PtyExecutor};
//!
//! let mut executor = PtyExecutor::new();
//! let command = RunCommand::new("python3", vec!["report.py".to_string()]);
//! let result = executor.execute(&command, true)?;
//! println!("took {:?}, failed: {}", result.duration, result.failed);
//! # Ok::<(), watchout_core::error::Error>(())
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod execution;
pub mod file_handling;
pub mod history;
pub mod orchestrator;
pub mod request;
pub mod run;
pub mod watch;
