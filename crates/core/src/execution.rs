//! Running the target inside a pseudo-terminal.
//!
//! The child gets the secondary side of a PTY as stdin, stdout and stderr, so
//! it behaves exactly as it would in the operator's terminal: colors,
//! progress bars and prompts all survive. Everything it writes is captured
//! as text and, when requested, mirrored to the operator's terminal as it
//! arrives. Lines typed by the operator are forwarded to the child.
//!
//! A run is a blocking unit of work: [`Executor::execute`] only returns once
//! the child's output has ended and the child has been reaped.

use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::unistd;
use portable_pty::{native_pty_system, CommandBuilder, PtySize};

use crate::config::RunCommand;
use crate::decoder::Utf8StreamDecoder;
use crate::error::{Error, Result};
use crate::run::RunResult;

/// Bytes requested from the PTY or the input per read.
const READ_CHUNK: usize = 8192;

/// Longest wait for output before checking the operator's input again.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const DEFAULT_ROWS: u16 = 24;
const DEFAULT_COLS: u16 = 80;

/// Runs one command to completion and reports what it did.
pub trait Executor {
    /// Executes `command`, mirroring its output live when `mirror_live` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be started at all. A child
    /// that exits with a non-zero code is not an error.
    fn execute(&mut self, command: &RunCommand, mirror_live: bool) -> Result<RunResult>;
}

/// [`Executor`] backed by a real pseudo-terminal.
pub struct PtyExecutor {
    size: PtySize,
    input: Option<Box<dyn AsFd>>,
    mirror: Box<dyn Write>,
}

impl Default for PtyExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PtyExecutor {
    /// Creates an executor that mirrors to stdout and forwards stdin.
    pub fn new() -> Self {
        Self {
            size: PtySize {
                rows: DEFAULT_ROWS,
                cols: DEFAULT_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
            input: Some(Box::new(io::stdin())),
            mirror: Box::new(io::stdout()),
        }
    }

    /// Sets the terminal size the child sees.
    #[must_use]
    pub fn with_size(mut self, rows: u16, cols: u16) -> Self {
        self.size.rows = rows.max(1);
        self.size.cols = cols.max(1);
        self
    }

    /// Replaces the live mirror target (stdout by default).
    #[must_use]
    pub fn with_mirror(mut self, mirror: impl Write + 'static) -> Self {
        self.mirror = Box::new(mirror);
        self
    }

    /// Forwards lines read from `input` instead of stdin.
    #[must_use]
    pub fn with_input(mut self, input: impl AsFd + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Stops forwarding any input to the child.
    #[must_use]
    pub fn without_input(mut self) -> Self {
        self.input = None;
        self
    }

    /// Collects the child's output until it ends, forwarding input lines in
    /// the meantime. Returns the captured text.
    fn pump(
        &mut self,
        chunks: &Receiver<Vec<u8>>,
        writer: &mut dyn Write,
        mirror_live: bool,
    ) -> String {
        let mut input = self
            .input
            .as_ref()
            .map(|input| LineForwarder::new(input.as_fd()));
        let mut decoder = Utf8StreamDecoder::new();
        let mut output = String::new();

        loop {
            if let Some(forwarder) = input.as_mut() {
                if !forwarder.forward_ready(writer) {
                    debug!("Input closed, no longer forwarding it");
                    input = None;
                }
            }

            let next = if input.is_some() {
                chunks.recv_timeout(INPUT_POLL_INTERVAL)
            } else {
                chunks.recv().map_err(|_| RecvTimeoutError::Disconnected)
            };

            match next {
                Ok(chunk) => {
                    let text = decoder.decode(&chunk);
                    capture(self.mirror.as_mut(), &mut output, &text, mirror_live);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let rest = decoder.finish();
        capture(self.mirror.as_mut(), &mut output, &rest, mirror_live);
        output
    }
}

/// Appends decoded text to the capture and mirrors it if asked to.
fn capture(mirror: &mut dyn Write, output: &mut String, text: &str, mirror_live: bool) {
    if text.is_empty() {
        return;
    }

    output.push_str(text);

    if mirror_live {
        let mirrored = mirror.write_all(text.as_bytes()).and_then(|()| mirror.flush());
        if let Err(e) = mirrored {
            warn!("Could not mirror output: {}", e);
        }
    }
}

/// Drains the PTY into `chunks` until the child side closes.
fn read_output(mut reader: Box<dyn Read + Send>, chunks: Sender<Vec<u8>>) {
    let mut buffer = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(size) => {
                if chunks.send(buffer[..size].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // EIO once the child side is closed on Linux
                debug!("PTY read ended: {}", e);
                break;
            }
        }
    }
}

/// Reads the operator's input without buffering and hands it to the child
/// one complete line at a time.
struct LineForwarder<'a> {
    fd: BorrowedFd<'a>,
    pending: Vec<u8>,
}

impl<'a> LineForwarder<'a> {
    fn new(fd: BorrowedFd<'a>) -> Self {
        Self {
            fd,
            pending: Vec::new(),
        }
    }

    /// Forwards whatever complete lines are ready right now.
    ///
    /// Returns `false` once the input has ended or failed.
    fn forward_ready(&mut self, writer: &mut dyn Write) -> bool {
        let mut fds = [PollFd::new(self.fd, PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::ZERO) {
            Ok(0) | Err(Errno::EINTR) => return true,
            Ok(_) => {}
            Err(errno) => {
                debug!("Polling input failed: {}", errno);
                return false;
            }
        }

        let mut buffer = [0u8; READ_CHUNK];
        match unistd::read(self.fd.as_raw_fd(), &mut buffer) {
            Ok(0) => {
                // A last line without a newline still belongs to the child.
                let rest = std::mem::take(&mut self.pending);
                send(writer, &rest);
                false
            }
            Ok(size) => {
                self.pending.extend_from_slice(&buffer[..size]);
                self.forward_lines(writer);
                true
            }
            Err(Errno::EINTR | Errno::EAGAIN) => true,
            Err(errno) => {
                debug!("Reading input failed: {}", errno);
                false
            }
        }
    }

    fn forward_lines(&mut self, writer: &mut dyn Write) {
        while let Some(end) = self.pending.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            send(writer, &line);
        }
    }
}

fn send(writer: &mut dyn Write, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }

    if let Err(e) = writer.write_all(bytes).and_then(|()| writer.flush()) {
        debug!("Could not forward input to child: {}", e);
    }
}

impl Executor for PtyExecutor {
    fn execute(&mut self, command: &RunCommand, mirror_live: bool) -> Result<RunResult> {
        let pair = native_pty_system()
            .openpty(self.size)
            .map_err(|e| Error::PtySetup(e.to_string()))?;

        // Everything that can fail is set up before the child exists.
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::PtySetup(e.to_string()))?;
        let mut writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::PtySetup(e.to_string()))?;

        let mut builder = CommandBuilder::new(&command.program);
        builder.args(&command.args);
        if let Some(working_directory) = &command.working_directory {
            builder.cwd(working_directory);
        }

        debug!("Spawning {:?} {:?}", command.program, command.args);
        let started_at = Local::now();
        let start = Instant::now();

        let mut child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| Error::spawn_error(&command.program, e))?;

        // Only the child may hold the secondary side, otherwise the primary
        // never sees end of output.
        drop(pair.slave);

        let (chunk_tx, chunks) = mpsc::channel();
        let reader_thread = thread::spawn(move || read_output(reader, chunk_tx));

        let output = self.pump(&chunks, writer.as_mut(), mirror_live);

        if reader_thread.join().is_err() {
            warn!("PTY reader thread panicked");
        }
        drop(writer);
        drop(pair.master);

        let status = child.wait()?;
        let duration = start.elapsed();
        let failed = !status.success();

        info!(
            "Run finished in {:?} with exit code {} ({} bytes captured)",
            duration,
            status.exit_code(),
            output.len()
        );

        Ok(RunResult::new(output, duration, started_at, failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::os::fd::OwnedFd;

    fn pipe_with(contents: &[u8]) -> (OwnedFd, File) {
        let (read_end, write_end) = unistd::pipe().unwrap();
        let mut write_end = File::from(write_end);
        write_end.write_all(contents).unwrap();
        (read_end, write_end)
    }

    #[test]
    fn test_forwards_every_buffered_line() {
        let (read_end, _write_end) = pipe_with(b"one\ntwo\nthr");
        let mut forwarder = LineForwarder::new(read_end.as_fd());
        let mut child = Vec::new();

        assert!(forwarder.forward_ready(&mut child));

        assert_eq!(child, b"one\ntwo\n");
        assert_eq!(forwarder.pending, b"thr");
    }

    #[test]
    fn test_nothing_ready_keeps_forwarding() {
        let (read_end, _write_end) = pipe_with(b"");
        let mut forwarder = LineForwarder::new(read_end.as_fd());
        let mut child = Vec::new();

        assert!(forwarder.forward_ready(&mut child));
        assert!(child.is_empty());
    }

    #[test]
    fn test_end_of_input_flushes_partial_line_and_stops() {
        let (read_end, write_end) = pipe_with(b"last");
        drop(write_end);
        let mut forwarder = LineForwarder::new(read_end.as_fd());
        let mut child = Vec::new();

        // First read takes the bytes, the second sees end of input.
        assert!(forwarder.forward_ready(&mut child));
        assert!(child.is_empty());
        assert!(!forwarder.forward_ready(&mut child));

        assert_eq!(child, b"last");
    }

    #[test]
    fn test_capture_mirrors_only_when_live() {
        let mut mirror = Vec::new();
        let mut output = String::new();

        capture(&mut mirror, &mut output, "quiet", false);
        capture(&mut mirror, &mut output, "loud", true);

        assert_eq!(output, "quietloud");
        assert_eq!(mirror, b"loud");
    }
}
