//! Task registry
//!
//! Mutex-guarded map from target identifier to task handle; the single
//! source of truth for active scans. `claim` reserves a target atomically
//! before any engine-side object exists, which closes the window where two
//! concurrent starts for the same target could both proceed.

use crate::core::sync::handle_mutex_poison;
use crate::scan::error::{ScanError, ScanResult};
use crate::scan::types::TaskHandle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
enum Slot {
    /// Target reserved by a start in progress; no handle yet
    Claimed,
    /// Watcher spawned; handle available for status/pause/resume
    Active(Arc<TaskHandle>),
}

#[derive(Debug, Default)]
pub struct TaskRegistry {
    entries: Mutex<HashMap<String, Slot>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically reserve the slot for a target. Fails with
    /// `ScanInProgress` while a claim is pending or a live watcher exists;
    /// terminal entries are replaced by the new claim.
    pub fn claim(&self, target: &str) -> ScanResult<()> {
        let mut entries = self.lock()?;
        match entries.get(target) {
            Some(Slot::Claimed) => Err(ScanError::ScanInProgress {
                target: target.to_string(),
            }),
            Some(Slot::Active(handle)) if handle.is_live() => Err(ScanError::ScanInProgress {
                target: target.to_string(),
            }),
            _ => {
                entries.insert(target.to_string(), Slot::Claimed);
                Ok(())
            }
        }
    }

    /// Complete a claim with the spawned watcher's handle
    pub fn activate(&self, target: &str, handle: Arc<TaskHandle>) -> ScanResult<()> {
        self.lock()?
            .insert(target.to_string(), Slot::Active(handle));
        Ok(())
    }

    /// Abort a claim that never produced a handle. Active entries are left
    /// untouched.
    pub fn release(&self, target: &str) -> ScanResult<()> {
        let mut entries = self.lock()?;
        if matches!(entries.get(target), Some(Slot::Claimed)) {
            entries.remove(target);
        }
        Ok(())
    }

    /// Handle for a target, if one was activated
    pub fn get(&self, target: &str) -> ScanResult<Option<Arc<TaskHandle>>> {
        Ok(self.lock()?.get(target).and_then(|slot| match slot {
            Slot::Active(handle) => Some(Arc::clone(handle)),
            Slot::Claimed => None,
        }))
    }

    /// Targets with a registered entry, claimed or active
    pub fn targets(&self) -> ScanResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    /// Number of live watchers
    pub fn active_count(&self) -> ScanResult<usize> {
        Ok(self
            .lock()?
            .values()
            .filter(|slot| matches!(slot, Slot::Active(handle) if handle.is_live()))
            .count())
    }

    fn lock(&self) -> ScanResult<MutexGuard<'_, HashMap<String, Slot>>> {
        handle_mutex_poison(self.entries.lock(), |message| ScanError::Internal {
            message,
        })
    }
}
