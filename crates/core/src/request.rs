//! Requests delivered to the orchestrator and the sources that produce them.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::error::Result;

/// A single instruction for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Execute the target once.
    Run,
    /// Show the next newer run.
    NavigateDown,
    /// Show the next older run.
    NavigateUp,
    /// End the session.
    Quit,
}

/// Something the event loop can wait on for requests.
pub trait RequestSource {
    /// Waits up to `timeout` for the next request.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input can no longer be read.
    fn poll_request(&mut self, timeout: Duration) -> Result<Option<Request>>;

    /// Throws away every request that is already waiting, returning how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input can no longer be read.
    fn discard_pending(&mut self) -> Result<usize>;
}

/// Request source fed through a channel, e.g. by the file watcher thread.
pub struct ChannelSource {
    receiver: Receiver<Request>,
    disconnected: bool,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<Request>) -> Self {
        Self {
            receiver,
            disconnected: false,
        }
    }
}

impl RequestSource for ChannelSource {
    fn poll_request(&mut self, timeout: Duration) -> Result<Option<Request>> {
        if self.disconnected {
            std::thread::sleep(timeout);
            return Ok(None);
        }

        match self.receiver.recv_timeout(timeout) {
            Ok(request) => Ok(Some(request)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.disconnected = true;
                Ok(None)
            }
        }
    }

    fn discard_pending(&mut self) -> Result<usize> {
        Ok(self.receiver.try_iter().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_source_delivers_in_order() {
        let (sender, receiver) = mpsc::channel();
        let mut source = ChannelSource::new(receiver);

        sender.send(Request::Run).unwrap();
        sender.send(Request::NavigateUp).unwrap();

        let timeout = Duration::from_millis(10);
        assert_eq!(source.poll_request(timeout).unwrap(), Some(Request::Run));
        assert_eq!(source.poll_request(timeout).unwrap(), Some(Request::NavigateUp));
        assert_eq!(source.poll_request(timeout).unwrap(), None);
    }

    #[test]
    fn test_discard_pending_empties_the_channel() {
        let (sender, receiver) = mpsc::channel();
        let mut source = ChannelSource::new(receiver);

        for _ in 0..3 {
            sender.send(Request::Run).unwrap();
        }

        assert_eq!(source.discard_pending().unwrap(), 3);
        assert_eq!(source.poll_request(Duration::from_millis(10)).unwrap(), None);
    }

    #[test]
    fn test_disconnected_channel_is_quiet() {
        let (sender, receiver) = mpsc::channel::<Request>();
        let mut source = ChannelSource::new(receiver);
        drop(sender);

        assert_eq!(source.poll_request(Duration::from_millis(1)).unwrap(), None);
        assert_eq!(source.poll_request(Duration::from_millis(1)).unwrap(), None);
    }
}
