//! Single-value completion channel with a cancellable bounded wait.
//!
//! The worker thread completes once; the initiating thread blocks on
//! receive-with-timeout, waking in short slices to observe cancellation.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::{Duration, Instant};

use crate::control::CancelToken;

/// Longest time a waiter goes without checking its cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(20);

/// Sending half; consumed by `complete`.
pub struct Completer<T>(SyncSender<T>);

/// Receiving half; consumed by `wait`.
pub struct Completion<T>(Receiver<T>);

/// How a bounded wait ended.
#[derive(Debug, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    Ready(T),
    TimedOut,
    Cancelled,
    /// The completer was dropped without a value (e.g. the worker panicked).
    Abandoned,
}

/// Create a connected completer/completion pair.
pub fn completion<T>() -> (Completer<T>, Completion<T>) {
    let (tx, rx) = mpsc::sync_channel(1);
    (Completer(tx), Completion(rx))
}

impl<T> Completer<T> {
    /// Deliver the value. Never blocks; a waiter that already gave up is ignored.
    pub fn complete(self, value: T) {
        let _ = self.0.try_send(value);
    }
}

impl<T> Completion<T> {
    /// Wait up to `timeout` for the value, returning early on cancellation.
    pub fn wait(self, timeout: Duration, cancel: &CancelToken) -> WaitOutcome<T> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    (deadline - now).min(CANCEL_POLL)
                }
                None => CANCEL_POLL,
            };
            match self.0.recv_timeout(slice) {
                Ok(value) => return WaitOutcome::Ready(value),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return WaitOutcome::Abandoned,
            }
        }
    }
}
