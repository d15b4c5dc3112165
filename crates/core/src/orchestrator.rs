//! The run orchestrator.
//!
//! A single [`Orchestrator`] owns the whole session state: configuration,
//! history and cursor, the run state and the file-watch listener. Requests
//! from every source end up in [`Orchestrator::handle`], on one thread.
//!
//! Runs execute synchronously on that thread. Nothing else is observed while
//! a child is running, and requests that pile up in the sources during a run
//! are thrown away afterwards rather than replayed.

use std::time::Duration;

use log::{debug, info};

use crate::config::{RunCommand, RunConfig};
use crate::error::Result;
use crate::execution::Executor;
use crate::history::{Recorded, RunHistory};
use crate::request::{Request, RequestSource};
use crate::run::RunResult;
use crate::watch::WatchHandle;

/// Shown when nothing runs until the operator asks for it.
pub const RUN_HINT: &str = "Press Enter to run";

/// How long the event loop waits on one source before trying the next.
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Values the status line is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct StatusView<'a> {
    /// 1-based position of the displayed run, 0 when there is none.
    pub position: usize,
    pub total: usize,
    pub entry: Option<&'a RunResult>,
    pub is_running: bool,
}

/// Draws what the orchestrator decides to show.
pub trait Presenter {
    /// Clears the screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written to.
    fn clear(&mut self) -> Result<()>;

    /// Prints the status line.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written to.
    fn status(&mut self, view: &StatusView<'_>) -> Result<()>;

    /// Prints captured output verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written to.
    fn output(&mut self, text: &str) -> Result<()>;

    /// Prints a short usage hint.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written to.
    fn hint(&mut self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Everything that changes over a session. Only the orchestrator writes it.
pub struct ExecutionState {
    pub config: RunConfig,
    pub history: RunHistory,
    pub run_state: RunState,
    watch: Option<WatchHandle>,
}

impl ExecutionState {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            history: RunHistory::new(),
            run_state: RunState::Idle,
            watch: None,
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watch.as_ref().is_some_and(WatchHandle::is_running)
    }
}

pub struct Orchestrator<E, P> {
    state: ExecutionState,
    command: RunCommand,
    executor: E,
    presenter: P,
}

impl<E: Executor, P: Presenter> Orchestrator<E, P> {
    pub fn new(config: RunConfig, executor: E, presenter: P) -> Self {
        let command = config.command();
        Self {
            state: ExecutionState::new(config),
            command,
            executor,
            presenter,
        }
    }

    /// Hands the file-watch listener to the orchestrator, which cancels it on quit.
    pub fn attach_watch(&mut self, watch: WatchHandle) {
        self.state.watch = Some(watch);
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn history(&self) -> &RunHistory {
        &self.state.history
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn is_terminated(&self) -> bool {
        self.state.run_state == RunState::Terminated
    }

    /// First screen of the session.
    ///
    /// When watching, the target runs straight away. Otherwise nothing runs
    /// until the operator asks for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the first run cannot be started or the screen
    /// cannot be drawn.
    pub fn start(&mut self) -> Result<()> {
        if self.state.config.watch {
            self.run_once()?;
            return Ok(());
        }

        self.presenter.clear()?;
        self.presenter.status(&StatusView {
            position: 0,
            total: 0,
            entry: None,
            is_running: false,
        })?;
        self.presenter.hint(RUN_HINT)
    }

    /// Applies one request. Returns whether a run was executed.
    ///
    /// # Errors
    ///
    /// Returns an error if a run could not be started or the screen could
    /// not be drawn. A failed run start also ends the session.
    pub fn handle(&mut self, request: Request) -> Result<bool> {
        debug!("Handling {:?} in state {:?}", request, self.state.run_state);

        match request {
            Request::Run => self.run_once(),
            Request::NavigateDown => self.navigate(Direction::Down).map(|()| false),
            Request::NavigateUp => self.navigate(Direction::Up).map(|()| false),
            Request::Quit => {
                self.quit();
                Ok(false)
            }
        }
    }

    /// Runs the target once, unless a run is already in progress or the
    /// session is over. Returns whether a run happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the executor could not start the run; the session
    /// is terminated in that case.
    pub fn run_once(&mut self) -> Result<bool> {
        match self.state.run_state {
            RunState::Running => {
                debug!("Run already in progress, dropping request");
                return Ok(false);
            }
            RunState::Terminated => return Ok(false),
            RunState::Idle => {}
        }

        self.state.run_state = RunState::Running;
        let result = match self.execute() {
            Ok(result) => result,
            Err(e) => {
                self.quit();
                return Err(e);
            }
        };
        self.state.run_state = RunState::Idle;

        let keep_duplicates = self.state.config.keep_duplicates;
        match self.state.history.record(result, keep_duplicates) {
            Recorded::Appended => info!("Run #{} recorded", self.state.history.len()),
            Recorded::Merged { repeats } => {
                info!("Run output unchanged, repeated {} times", repeats + 1);
            }
        }

        self.render_current()?;
        Ok(true)
    }

    fn execute(&mut self) -> Result<RunResult> {
        let history = &self.state.history;
        let count = history.len();

        self.presenter.clear()?;
        self.presenter.status(&StatusView {
            position: count + 1,
            total: count.max(1),
            entry: None,
            is_running: true,
        })?;

        let lazy_previous = if self.state.config.lazy {
            history.last()
        } else {
            None
        };

        // Lazy mode keeps the last output on screen and runs silently.
        let mirror_live = match lazy_previous {
            Some(previous) => {
                self.presenter.output(&previous.output)?;
                false
            }
            None => true,
        };

        self.executor.execute(&self.command, mirror_live)
    }

    /// Moves the cursor one step and shows the entry under it.
    ///
    /// # Errors
    ///
    /// Returns an error if the screen cannot be drawn.
    pub fn navigate(&mut self, direction: Direction) -> Result<()> {
        if self.state.history.is_empty() {
            return Ok(());
        }

        let cursor = match direction {
            Direction::Up => self.state.history.move_up(),
            Direction::Down => self.state.history.move_down(),
        };
        debug!("Cursor moved {:?} to {:?}", direction, cursor);

        self.render_current()
    }

    fn render_current(&mut self) -> Result<()> {
        let history = &self.state.history;
        let (Some(cursor), Some(entry)) = (history.cursor(), history.current()) else {
            return Ok(());
        };

        self.presenter.clear()?;
        self.presenter.status(&StatusView {
            position: cursor + 1,
            total: history.len(),
            entry: Some(entry),
            is_running: false,
        })?;
        self.presenter.output(&entry.output)
    }

    /// Ends the session and stops the file watcher.
    pub fn quit(&mut self) {
        self.state.run_state = RunState::Terminated;

        if let Some(mut watch) = self.state.watch.take() {
            watch.cancel();
        }
    }

    /// Serves requests from `sources` until a quit request arrives.
    ///
    /// Sources are polled in turn. After every run, requests that arrived
    /// while it was executing are discarded.
    ///
    /// # Errors
    ///
    /// Returns the first error from a source or from handling a request.
    pub fn run_until_quit(&mut self, sources: &mut [&mut dyn RequestSource]) -> Result<()> {
        if sources.is_empty() {
            return Ok(());
        }

        let mut next = 0;
        while !self.is_terminated() {
            let request = sources[next].poll_request(POLL_INTERVAL)?;
            next = (next + 1) % sources.len();

            let Some(request) = request else {
                continue;
            };

            if self.handle(request)? {
                for source in sources.iter_mut() {
                    let dropped = source.discard_pending()?;
                    if dropped > 0 {
                        debug!("Dropped {} requests that arrived during the run", dropped);
                    }
                }
            }
        }

        Ok(())
    }
}
