use std::time::Duration;

use chrono::{DateTime, Local};

/// The outcome of one execution of the target.
///
/// Created by the executor with `repeats == 0`; only the history merge step
/// produces values with a non-zero repeat count.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub output: String,
    pub duration: Duration,
    pub started_at: DateTime<Local>,
    pub failed: bool,
    pub repeats: u32,
}

impl RunResult {
    pub fn new(
        output: String,
        duration: Duration,
        started_at: DateTime<Local>,
        failed: bool,
    ) -> Self {
        Self {
            output,
            duration,
            started_at,
            failed,
            repeats: 0,
        }
    }

    /// Folds `newer` into this entry: keeps the output, takes the newer
    /// timing and exit status, and counts one more repeat.
    #[must_use]
    pub fn merged_with(&self, newer: RunResult) -> Self {
        Self {
            output: self.output.clone(),
            duration: newer.duration,
            started_at: newer.started_at,
            failed: newer.failed,
            repeats: self.repeats + 1,
        }
    }

    pub fn same_output_as(&self, other: &RunResult) -> bool {
        self.output == other.output
    }
}
