//! Scan orchestration
//!
//! Central coordination for long-running vulnerability scans: the
//! [`ScanManager`] drives the engine-side lifecycle (target, task, start)
//! and spawns one background watcher per active scan. The [`TaskRegistry`]
//! is the single source of truth for "is a scan running for this target",
//! with atomic claim semantics so two concurrent starts for one target
//! cannot race two engine-side tasks into existence.
//!
//! Watchers poll the engine until a terminal status, then run the
//! enrichment pipeline and persist the normalized findings keyed by target.
//! Each watcher publishes its state through a watch channel and honors a
//! cancellation signal, so no background unit outlives observability.

pub mod error;
pub mod manager;
pub mod registry;
pub mod types;
pub mod watcher;

pub use error::{ScanError, ScanResult};
pub use manager::{ScanManager, ScanSettings};
pub use registry::TaskRegistry;
pub use types::{ScanStatusReport, TaskHandle, WatcherPhase, WatcherState};

#[cfg(test)]
mod tests;
