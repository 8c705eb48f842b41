//! Scan task handles and watcher state

use crate::engine::types::TaskStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use strum_macros::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle phase of a background watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum WatcherPhase {
    /// Watcher is alive and polling the engine
    Polling,
    /// Scan finished and the enriched report was persisted
    Completed,
    /// Scan or report production failed; no output was written
    Failed,
    /// Poll budget exhausted before the scan reached a terminal status
    TimedOut,
    /// Watcher was cancelled; the engine-side task keeps running
    Cancelled,
}

impl WatcherPhase {
    pub fn is_terminal(self) -> bool {
        self != WatcherPhase::Polling
    }
}

/// Snapshot of a watcher's view of its task, published after every poll
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WatcherState {
    pub phase: WatcherPhase,
    pub status: TaskStatus,
    pub progress: i32,
}

impl WatcherState {
    pub fn initial() -> Self {
        Self {
            phase: WatcherPhase::Polling,
            status: TaskStatus::New,
            progress: 0,
        }
    }
}

/// Status view returned by `ScanManager::status`
#[derive(Debug, Clone, Serialize)]
pub struct ScanStatusReport {
    pub target: String,
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: i32,
    pub phase: WatcherPhase,
}

/// Handle binding a target to its engine-side task/target ids and to the
/// background watcher observing it. Owned by the registry; the watcher only
/// holds the channel ends.
#[derive(Debug)]
pub struct TaskHandle {
    pub target: String,
    pub task_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
    state_rx: watch::Receiver<WatcherState>,
    cancel_tx: watch::Sender<bool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl TaskHandle {
    pub fn new(
        target: impl Into<String>,
        task_id: impl Into<String>,
        target_id: impl Into<String>,
        state_rx: watch::Receiver<WatcherState>,
        cancel_tx: watch::Sender<bool>,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            target: target.into(),
            task_id: task_id.into(),
            target_id: target_id.into(),
            created_at: Utc::now(),
            state_rx,
            cancel_tx,
            join: Mutex::new(Some(join)),
        }
    }

    /// Latest state the watcher published
    pub fn state(&self) -> WatcherState {
        *self.state_rx.borrow()
    }

    /// Whether the watcher is still polling
    pub fn is_live(&self) -> bool {
        !self.state().phase.is_terminal()
    }

    /// Signal the watcher to stop at its next suspension point
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Take the watcher's join handle; `None` if already taken
    pub fn take_join(&self) -> Option<JoinHandle<()>> {
        self.join.lock().ok().and_then(|mut slot| slot.take())
    }
}
