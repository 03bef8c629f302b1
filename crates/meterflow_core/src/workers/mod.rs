//! Background task management.
//!
//! Every long-running operation (transform, save, batch save, path
//! discovery) runs on its own worker thread, at most one per kind.
//! Starting a new task of a kind first cancels and tears down the prior
//! one. Cancellation is advisory: a boolean the worker checks at file
//! and loop boundaries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Cooperative cancellation flag shared with a worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the worker stops at its next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The kinds of background work, one active task per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Read + transform of source files.
    Transform,
    /// Single-file save.
    Save,
    /// Batch commit of all cached results.
    BatchSave,
    /// Recursive source file discovery.
    PathDiscovery,
}

impl TaskKind {
    /// Display name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Save => "save",
            Self::BatchSave => "batch-save",
            Self::PathDiscovery => "path-discovery",
        }
    }
}

struct TaskHandle {
    cancel: CancelToken,
    done: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

/// One active background task slot per [`TaskKind`].
pub struct TaskSlots {
    slots: Mutex<HashMap<TaskKind, TaskHandle>>,
    teardown_timeout: Duration,
}

impl Default for TaskSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSlots {
    /// Slots with the default 3-second teardown timeout.
    pub fn new() -> Self {
        Self::with_teardown_timeout(Duration::from_secs(3))
    }

    /// Slots with a custom teardown timeout.
    pub fn with_teardown_timeout(teardown_timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            teardown_timeout,
        }
    }

    /// Spawn a task of the given kind, cancelling and tearing down any
    /// prior task of the same kind first. Returns the new task's cancel
    /// token.
    pub fn spawn<F>(&self, kind: TaskKind, work: F) -> CancelToken
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        self.cancel_and_teardown(kind);

        let cancel = CancelToken::new();
        let done = Arc::new(AtomicBool::new(false));
        let worker_cancel = cancel.clone();
        let worker_done = Arc::clone(&done);
        let join = std::thread::spawn(move || {
            work(worker_cancel);
            worker_done.store(true, Ordering::SeqCst);
        });

        self.slots.lock().insert(
            kind,
            TaskHandle {
                cancel: cancel.clone(),
                done,
                join,
            },
        );
        cancel
    }

    /// Whether a task of the kind is still running.
    pub fn is_running(&self, kind: TaskKind) -> bool {
        let slots = self.slots.lock();
        slots
            .get(&kind)
            .is_some_and(|h| !h.done.load(Ordering::SeqCst))
    }

    /// Cancel a task of the kind (if any) and wait out its teardown.
    pub fn cancel(&self, kind: TaskKind) {
        self.cancel_and_teardown(kind);
    }

    /// Cancel every running task.
    pub fn cancel_all(&self) {
        for kind in [
            TaskKind::Transform,
            TaskKind::Save,
            TaskKind::BatchSave,
            TaskKind::PathDiscovery,
        ] {
            self.cancel_and_teardown(kind);
        }
    }

    fn cancel_and_teardown(&self, kind: TaskKind) {
        let Some(handle) = self.slots.lock().remove(&kind) else {
            return;
        };
        handle.cancel.cancel();

        // Wait for the worker to reach a checkpoint; a worker past the
        // timeout is detached rather than blocked on. It still observes
        // its token at the next checkpoint.
        let deadline = Instant::now() + self.teardown_timeout;
        while !handle.done.load(Ordering::SeqCst) {
            if Instant::now() >= deadline {
                tracing::warn!(
                    "{} task did not stop within {:?}; detaching",
                    kind.as_str(),
                    self.teardown_timeout
                );
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let _ = handle.join.join();
    }
}
