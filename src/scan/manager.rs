//! Scan manager
//!
//! Public orchestration surface: starts scans, answers status queries,
//! pauses/resumes/cancels tasks and hands out the stored normalized
//! findings. One background watcher is spawned per started scan; the
//! manager itself never blocks on scan completion.

use crate::core::config::Config;
use crate::engine::client::GmpClient;
use crate::engine::transport::EngineTransport;
use crate::enrich::types::Finding;
use crate::scan::error::{ScanError, ScanResult};
use crate::scan::registry::TaskRegistry;
use crate::scan::types::{ScanStatusReport, TaskHandle, WatcherPhase, WatcherState};
use crate::scan::watcher::{self, WatcherContext};
use crate::store::FindingStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Orchestration settings, usually derived from [`Config`]
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub config_name: String,
    pub report_format_name: String,
    pub port_list_id: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub result_dir: PathBuf,
    pub lookup_path: PathBuf,
}

impl From<&Config> for ScanSettings {
    fn from(config: &Config) -> Self {
        Self {
            config_name: config.scan.config_name.clone(),
            report_format_name: config.scan.report_format_name.clone(),
            port_list_id: config.engine.port_list_id.clone(),
            poll_interval: Duration::from_secs(config.scan.poll_interval_secs),
            max_poll_attempts: config.scan.max_poll_attempts,
            result_dir: config.scan.result_dir.clone(),
            lookup_path: config.enrich.lookup_path.clone(),
        }
    }
}

pub struct ScanManager {
    client: Arc<GmpClient>,
    registry: Arc<TaskRegistry>,
    store: Arc<FindingStore>,
    settings: ScanSettings,
}

impl ScanManager {
    pub fn new(transport: Arc<dyn EngineTransport>, settings: ScanSettings) -> Self {
        let client = Arc::new(GmpClient::new(transport, settings.port_list_id.clone()));
        let store = Arc::new(FindingStore::new(&settings.result_dir));
        Self {
            client,
            registry: Arc::new(TaskRegistry::new()),
            store,
            settings,
        }
    }

    /// Start a scan for a target and return the engine task id. Returns
    /// immediately; completion is handled by a detached background watcher.
    /// Fails with `ScanInProgress` while a live watcher exists for the
    /// target.
    pub async fn start(&self, target: &str) -> ScanResult<String> {
        self.registry.claim(target)?;
        match self.start_claimed(target).await {
            Ok(task_id) => Ok(task_id),
            Err(e) => {
                self.registry.release(target)?;
                Err(e)
            }
        }
    }

    async fn start_claimed(&self, target: &str) -> ScanResult<String> {
        let config_id = self.client.scan_config_id(&self.settings.config_name).await?;
        let format_id = self
            .client
            .report_format_id(&self.settings.report_format_name)
            .await?;
        let target_id = self.client.find_or_create_target(target).await?;
        let task_id = self.client.create_task(&target_id, &config_id).await?;
        self.client.start_task(&task_id).await?;

        let (state_tx, state_rx) = watch::channel(WatcherState::initial());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let join = tokio::spawn(watcher::run(WatcherContext {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            target: target.to_string(),
            task_id: task_id.clone(),
            report_format_id: format_id,
            lookup_path: self.settings.lookup_path.clone(),
            poll_interval: self.settings.poll_interval,
            max_poll_attempts: self.settings.max_poll_attempts,
            state_tx,
            cancel_rx,
        }));

        let handle = Arc::new(TaskHandle::new(
            target, &task_id, &target_id, state_rx, cancel_tx, join,
        ));
        self.registry.activate(target, handle)?;

        log::info!("scan started for {} (task {})", target, task_id);
        Ok(task_id)
    }

    /// Engine status and watcher phase for a target. While the watcher is
    /// live the engine is polled for fresh progress; after a terminal phase
    /// the last observed values are reported.
    pub async fn status(&self, target: &str) -> ScanResult<ScanStatusReport> {
        let handle = self.handle(target)?;
        let state = handle.state();

        let (status, progress) = if state.phase.is_terminal() {
            (state.status, state.progress)
        } else {
            self.client.task_status(&handle.task_id).await?
        };

        Ok(ScanStatusReport {
            target: handle.target.clone(),
            task_id: handle.task_id.clone(),
            status,
            progress,
            phase: state.phase,
        })
    }

    /// Pause the engine-side task for a target. The watcher keeps polling
    /// through the paused state.
    pub async fn pause(&self, target: &str) -> ScanResult<()> {
        let handle = self.handle(target)?;
        self.client.stop_task(&handle.task_id).await?;
        log::info!("scan paused for {} (task {})", target, handle.task_id);
        Ok(())
    }

    /// Resume a paused or stopped engine-side task
    pub async fn resume(&self, target: &str) -> ScanResult<()> {
        let handle = self.handle(target)?;
        self.client.resume_task(&handle.task_id).await?;
        log::info!("scan resumed for {} (task {})", target, handle.task_id);
        Ok(())
    }

    /// Stop the watcher for a target. The engine-side task is deliberately
    /// left running; a later `start` for the target claims a fresh slot.
    pub fn cancel(&self, target: &str) -> ScanResult<()> {
        self.handle(target)?.cancel();
        Ok(())
    }

    /// Stored normalized findings for a target; `Ok(None)` when no report
    /// has been produced.
    pub fn fetch_normalized(&self, target: &str) -> ScanResult<Option<Vec<Finding>>> {
        Ok(self.store.load(target)?)
    }

    /// Await the watcher for a target and return its terminal phase
    pub async fn wait(&self, target: &str) -> ScanResult<WatcherPhase> {
        let handle = self.handle(target)?;
        if let Some(join) = handle.take_join() {
            if let Err(e) = join.await {
                log::error!("watcher task for {} panicked: {}", target, e);
            }
        }
        Ok(handle.state().phase)
    }

    /// Path the enriched report for a target is (or will be) stored at
    pub fn report_path(&self, target: &str) -> PathBuf {
        self.store.path_for(target)
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    fn handle(&self, target: &str) -> ScanResult<Arc<TaskHandle>> {
        self.registry
            .get(target)?
            .ok_or_else(|| ScanError::TaskNotFound {
                target: target.to_string(),
            })
    }
}
