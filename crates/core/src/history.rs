//! In-memory run history with a display cursor.
//!
//! The history only ever grows at the end, and only its last entry may be
//! replaced (when a new run is merged into it). The cursor selects the entry
//! that is currently displayed and is always in bounds once anything has been
//! recorded.

use log::debug;

use crate::run::RunResult;

/// What [`RunHistory::record`] did with a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Appended,
    Merged { repeats: u32 },
}

#[derive(Debug, Default)]
pub struct RunHistory {
    entries: Vec<RunResult>,
    cursor: Option<usize>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&RunResult> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&RunResult> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[RunResult] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&RunResult> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    /// Records a finished run and moves the cursor to the newest entry.
    ///
    /// A run whose output is identical to the last entry's is merged into it
    /// unless `keep_duplicates` is set.
    pub fn record(&mut self, result: RunResult, keep_duplicates: bool) -> Recorded {
        let merge = !keep_duplicates
            && self
                .entries
                .last()
                .is_some_and(|last| last.same_output_as(&result));

        let recorded = match self.entries.last_mut() {
            Some(last) if merge => {
                *last = last.merged_with(result);
                Recorded::Merged {
                    repeats: last.repeats,
                }
            }
            _ => {
                self.entries.push(result);
                Recorded::Appended
            }
        };

        self.cursor = Some(self.entries.len() - 1);
        debug!("Recorded run: {:?}, history length {}", recorded, self.len());
        recorded
    }

    /// Moves the cursor one entry towards the newest run, stopping at the last.
    pub fn move_down(&mut self) -> Option<usize> {
        let last_index = self.entries.len().checked_sub(1)?;
        let next = self.cursor.map_or(last_index, |cursor| (cursor + 1).min(last_index));
        self.cursor = Some(next);
        self.cursor
    }

    /// Moves the cursor one entry towards the oldest run, stopping at the first.
    pub fn move_up(&mut self) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let next = self.cursor.map_or(0, |cursor| cursor.saturating_sub(1));
        self.cursor = Some(next);
        self.cursor
    }
}
