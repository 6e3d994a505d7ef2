//! Signals used to hand completion notices from service callbacks to the
//! sequencing thread.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

/// Counting signal: every `notify` releases exactly one `wait`.
///
/// Only the owner of the `Signal` may wait; services receive a [`Notifier`].
pub struct Signal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

/// Cloneable sending half of a [`Signal`].
///
/// Notifying after the signal has been dropped is a no-op.
#[derive(Clone)]
pub struct Notifier {
    tx: Sender<()>,
}

impl Notifier {
    pub fn notify(&self) {
        let _ = self.tx.send(());
    }
}

impl Signal {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier { tx: self.tx.clone() }
    }

    /// Blocks until one notification is available, consuming it.
    ///
    /// Returns `false` if `timeout` elapsed first. `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        match timeout {
            // The signal keeps its own sender alive, so recv cannot disconnect.
            None => self.rx.recv().is_ok(),
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(()) => true,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
            },
        }
    }

    /// Number of notifications received but not yet waited for.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Completed,
    Abandoned,
}

struct CompletionState {
    state: Mutex<RunState>,
    changed: Condvar,
}

/// One-shot, multi-observer notice that a sequence run finished successfully.
///
/// Fires at most once. A run that aborts abandons the signal instead, which
/// wakes waiters without reporting completion.
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<CompletionState>,
}

impl CompletionSignal {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(CompletionState {
                state: Mutex::new(RunState::Running),
                changed: Condvar::new(),
            }),
        }
    }

    /// Marks the run complete. Returns `false` if the signal had already settled.
    pub(crate) fn fire(&self) -> bool {
        self.settle(RunState::Completed)
    }

    pub(crate) fn abandon(&self) -> bool {
        self.settle(RunState::Abandoned)
    }

    fn settle(&self, outcome: RunState) -> bool {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != RunState::Running {
            return false;
        }
        *state = outcome;
        self.inner.changed.notify_all();
        true
    }

    pub fn is_complete(&self) -> bool {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner) == RunState::Completed
    }

    /// Blocks until the run settles. Returns `true` only if it completed.
    ///
    /// Returns `false` on abandonment or when `timeout` elapses first.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let guard = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        let still_running = |state: &mut RunState| *state == RunState::Running;

        let state = match timeout {
            None => *self
                .inner
                .changed
                .wait_while(guard, still_running)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                *self
                    .inner
                    .changed
                    .wait_timeout_while(guard, timeout, still_running)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };
        state == RunState::Completed
    }

    /// Runs `on_done` on a new thread once the run completes.
    ///
    /// The callback is skipped if the run is abandoned.
    pub fn on_complete<F>(&self, on_done: F) -> std::io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let signal = self.clone();
        thread::Builder::new()
            .name("capture-cleanup".into())
            .spawn(move || {
                if signal.wait(None) {
                    on_done();
                }
            })
    }
}
