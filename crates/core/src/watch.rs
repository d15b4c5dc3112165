//! File-change source.
//!
//! Watches the target script and turns each burst of changes into one
//! [`Request::Run`]. The listener lives on its own thread and only ever sends
//! requests; it never runs anything itself.
//!
//! The parent directory is watched rather than the file, so editors that save
//! by writing a new file and renaming it over the old one keep triggering.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{Error, Result};
use crate::request::Request;

/// Changes closer together than this are reported as a single change.
pub const COALESCE_WINDOW: Duration = Duration::from_millis(50);

#[derive(Debug)]
enum WatchSignal {
    Changed,
    Stop,
}

/// Handle to the running listener thread.
///
/// Dropping the handle cancels the listener as well.
pub struct WatchHandle {
    signal_tx: Sender<WatchSignal>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Asks the listener to stop and waits until it has released the watch.
    pub fn cancel(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        // The listener may already be gone if the request side hung up.
        let _ = self.signal_tx.send(WatchSignal::Stop);

        if thread.join().is_err() {
            warn!("File watcher thread panicked");
        }
        debug!("File watcher cancelled");
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts watching `target`, sending a [`Request::Run`] on `requests` for
/// every coalesced change.
///
/// # Errors
///
/// Returns an error if the OS watch could not be set up.
pub fn spawn_file_watcher(target: &Path, requests: Sender<Request>) -> Result<WatchHandle> {
    let target = std::path::absolute(target).unwrap_or_else(|_| target.to_path_buf());
    let directory = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (signal_tx, signal_rx) = mpsc::channel();
    let watcher_tx = signal_tx.clone();
    let watched = target.clone();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_change_to(&event, &watched) => {
            let _ = watcher_tx.send(WatchSignal::Changed);
        }
        Ok(_) => {}
        Err(e) => warn!("File watch error: {}", e),
    })
    .map_err(|e| Error::watch_error(target.display().to_string(), e))?;

    watcher
        .watch(&directory, RecursiveMode::NonRecursive)
        .map_err(|e| Error::watch_error(target.display().to_string(), e))?;

    debug!("Watching {} for changes", target.display());
    let thread = thread::spawn(move || listen(watcher, signal_rx, requests));

    Ok(WatchHandle {
        signal_tx,
        thread: Some(thread),
    })
}

fn is_change_to(event: &Event, target: &Path) -> bool {
    let is_change = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );

    is_change
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == target.file_name())
}

fn listen(watcher: RecommendedWatcher, signals: Receiver<WatchSignal>, requests: Sender<Request>) {
    // Held until the loop ends; dropping it closes the OS watch.
    let _watcher = watcher;

    while let Ok(signal) = signals.recv() {
        if matches!(signal, WatchSignal::Stop) {
            break;
        }

        if !coalesce(&signals) {
            break;
        }

        if requests.send(Request::Run).is_err() {
            debug!("Request channel closed, stopping file watcher");
            break;
        }
    }
}

/// Swallows further changes for one coalescing window.
///
/// Returns `false` if the listener was told to stop in the meantime.
fn coalesce(signals: &Receiver<WatchSignal>) -> bool {
    let deadline = Instant::now() + COALESCE_WINDOW;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match signals.recv_timeout(remaining) {
            Ok(WatchSignal::Changed) => {}
            Ok(WatchSignal::Stop) | Err(RecvTimeoutError::Disconnected) => return false,
            Err(RecvTimeoutError::Timeout) => return true,
        }
    }
}
