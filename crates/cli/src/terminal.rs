//! Drawing to the operator's terminal and switching its input modes.

use std::io::Write;

use chrono::Local;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, is_raw_mode_enabled, Clear, ClearType,
};
use watchout_core::config::RunCommand;
use watchout_core::error::Result;
use watchout_core::execution::Executor;
use watchout_core::orchestrator::{Presenter, StatusView};
use watchout_core::run::RunResult;

use crate::status::StatusBar;

/// Width used when the terminal size cannot be read.
const FALLBACK_WIDTH: usize = 80;

/// Presenter that writes straight to a terminal.
///
/// Lines end in `\r\n` since the terminal is normally in raw mode.
pub struct TerminalPresenter<W: Write> {
    out: W,
    status_bar: StatusBar,
    width: Option<usize>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, status_bar: StatusBar) -> Self {
        Self {
            out,
            status_bar,
            width: None,
        }
    }

    /// Fixes the status line width instead of asking the terminal.
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn width(&self) -> usize {
        self.width.unwrap_or_else(|| {
            terminal::size().map_or(FALLBACK_WIDTH, |(columns, _)| usize::from(columns))
        })
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn clear(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()?;
        Ok(())
    }

    fn status(&mut self, view: &StatusView<'_>) -> Result<()> {
        let rendered = self.status_bar.render(view, Local::now(), self.width());
        queue!(self.out, Print(rendered.styled), Print("\r\n"))?;
        self.out.flush()?;
        Ok(())
    }

    fn output(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn hint(&mut self, text: &str) -> Result<()> {
        queue!(self.out, Print(text.dim().italic()), Print("\r\n"))?;
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps the terminal in raw mode for as long as it lives.
pub struct RawModeGuard;

impl RawModeGuard {
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be enabled.
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Disable raw mode on drop
        let _ = disable_raw_mode();
    }
}

/// Runs the inner executor with the terminal back in cooked mode, so the
/// operator's input reaches the child a line at a time with echo.
///
/// Signal keys stay active in cooked mode. Ctrl-C during a run interrupts
/// watchout itself rather than the child, whose PTY is a separate session.
pub struct CookedModeExecutor<E> {
    inner: E,
}

impl<E: Executor> CookedModeExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Executor> Executor for CookedModeExecutor<E> {
    fn execute(&mut self, command: &RunCommand, mirror_live: bool) -> Result<RunResult> {
        if !is_raw_mode_enabled()? {
            return self.inner.execute(command, mirror_live);
        }

        disable_raw_mode()?;
        let result = self.inner.execute(command, mirror_live);
        enable_raw_mode()?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn presenter() -> TerminalPresenter<Vec<u8>> {
        TerminalPresenter::new(Vec::new(), StatusBar::new("demo", false)).with_width(60)
    }

    fn written(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_output_is_written_verbatim() {
        let mut presenter = presenter();
        presenter.output("one\r\n\x1b[31mred\x1b[0m\r\n").unwrap();

        assert_eq!(written(presenter), "one\r\n\x1b[31mred\x1b[0m\r\n");
    }

    #[test]
    fn test_status_line_ends_with_terminal_newline() {
        let mut presenter = presenter();
        presenter
            .status(&StatusView {
                position: 1,
                total: 1,
                entry: None,
                is_running: true,
            })
            .unwrap();

        let text = written(presenter);
        assert!(text.contains("demo"));
        assert!(text.contains("⬤"));
        assert!(text.ends_with("\r\n"));
    }

    #[test]
    fn test_hint_is_printed_on_its_own_line() {
        let mut presenter = presenter();
        presenter.hint("Press Enter to run").unwrap();

        let text = written(presenter);
        assert!(text.contains("Press Enter to run"));
        assert!(text.ends_with("\r\n"));
    }

    #[test]
    fn test_clear_emits_escape_sequences() {
        let mut presenter = presenter();
        presenter.clear().unwrap();

        assert!(written(presenter).starts_with('\x1b'));
    }

    struct Recording(Vec<String>);

    impl Executor for Recording {
        fn execute(&mut self, command: &RunCommand, _mirror_live: bool) -> Result<RunResult> {
            self.0.push(command.program.clone());
            Ok(RunResult::new(
                String::new(),
                Duration::ZERO,
                Local::now(),
                false,
            ))
        }
    }

    #[test]
    fn test_cooked_mode_executor_delegates() {
        let mut executor = CookedModeExecutor::new(Recording(Vec::new()));
        let command = RunCommand::new("python3", vec!["script.py".to_string()]);

        executor.execute(&command, true).unwrap();
        assert_eq!(executor.inner().0, vec!["python3".to_string()]);
    }
}
