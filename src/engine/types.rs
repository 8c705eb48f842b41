//! Engine task status

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Status of an engine-side scan task as reported in GMP `<status>` text.
///
/// Anything the engine reports that is not one of the known values parses to
/// `Unknown`, which the watcher treats as terminal failure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum TaskStatus {
    New,
    Queued,
    Requested,
    Scheduled,
    Running,
    #[strum(serialize = "Stop Requested")]
    StopRequested,
    Paused,
    Stopped,
    Done,
    Interrupted,
    Unknown,
}

impl TaskStatus {
    /// Parse the engine's status text; unrecognized values map to `Unknown`
    pub fn parse(text: &str) -> Self {
        text.trim().parse().unwrap_or(TaskStatus::Unknown)
    }

    /// Statuses the background watcher keeps polling through. Paused and
    /// Stopped scans are not progressing but may be resumed, so the watcher
    /// does not give up on them.
    pub fn is_pollable(self) -> bool {
        matches!(
            self,
            TaskStatus::New
                | TaskStatus::Queued
                | TaskStatus::Requested
                | TaskStatus::Scheduled
                | TaskStatus::Running
                | TaskStatus::StopRequested
                | TaskStatus::Paused
                | TaskStatus::Stopped
        )
    }

    /// Statuses from which a task may be stopped
    pub fn is_stoppable(self) -> bool {
        matches!(
            self,
            TaskStatus::Running | TaskStatus::Requested | TaskStatus::Queued
        )
    }

    /// Statuses from which a task may be resumed
    pub fn is_resumable(self) -> bool {
        matches!(self, TaskStatus::Paused | TaskStatus::Stopped)
    }
}
