//! Background watcher
//!
//! One detached task per active scan. Polls the engine until the task
//! reaches a terminal status, then fetches the raw report, runs the
//! enrichment pipeline and persists the normalized findings. Failures are
//! logged and recorded as the `Failed` phase; they never propagate, and no
//! partial output is written.

use crate::engine::client::GmpClient;
use crate::engine::types::TaskStatus;
use crate::enrich::lookup::LookupTable;
use crate::enrich::pipeline::enrich;
use crate::scan::error::ScanResult;
use crate::scan::types::{WatcherPhase, WatcherState};
use crate::store::FindingStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub(crate) struct WatcherContext {
    pub client: Arc<GmpClient>,
    pub store: Arc<FindingStore>,
    pub target: String,
    pub task_id: String,
    pub report_format_id: String,
    pub lookup_path: PathBuf,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub state_tx: watch::Sender<WatcherState>,
    pub cancel_rx: watch::Receiver<bool>,
}

pub(crate) async fn run(mut ctx: WatcherContext) {
    log::info!(
        "waiting for scan on {} to complete (task {})",
        ctx.target,
        ctx.task_id
    );

    let mut last = WatcherState::initial();
    let mut attempts: u32 = 0;

    let phase = loop {
        match ctx.client.task_status(&ctx.task_id).await {
            Ok((status, progress)) => {
                last.status = status;
                last.progress = progress;
                publish(&ctx.state_tx, last);

                if status == TaskStatus::Done {
                    break match produce_report(&ctx).await {
                        Ok(path) => {
                            log::info!(
                                "enriched report for {} saved to {}",
                                ctx.target,
                                path.display()
                            );
                            WatcherPhase::Completed
                        }
                        Err(e) => {
                            log::error!("failed to produce report for {}: {}", ctx.target, e);
                            WatcherPhase::Failed
                        }
                    };
                }
                if !status.is_pollable() {
                    log::error!(
                        "task {} for {} ended with unexpected status '{}'",
                        ctx.task_id,
                        ctx.target,
                        status
                    );
                    break WatcherPhase::Failed;
                }
            }
            Err(e) => {
                log::error!("status poll for {} failed: {}", ctx.target, e);
                break WatcherPhase::Failed;
            }
        }

        attempts += 1;
        if attempts >= ctx.max_poll_attempts {
            log::warn!(
                "giving up on {} after {} status polls (task {})",
                ctx.target,
                attempts,
                ctx.task_id
            );
            break WatcherPhase::TimedOut;
        }

        tokio::select! {
            _ = tokio::time::sleep(ctx.poll_interval) => {}
            changed = ctx.cancel_rx.changed() => {
                if changed.is_err() || *ctx.cancel_rx.borrow() {
                    log::info!("watcher for {} cancelled", ctx.target);
                    break WatcherPhase::Cancelled;
                }
            }
        }
    };

    last.phase = phase;
    publish(&ctx.state_tx, last);
}

async fn produce_report(ctx: &WatcherContext) -> ScanResult<PathBuf> {
    let report_id = ctx.client.report_id(&ctx.task_id).await?;
    let raw = ctx
        .client
        .fetch_report(&report_id, &ctx.report_format_id)
        .await?;

    let lookup = LookupTable::load_if_present(&ctx.lookup_path)?;
    if lookup.is_none() {
        log::debug!(
            "lookup corpus '{}' not present, using fixed defaults",
            ctx.lookup_path.display()
        );
    }

    let findings = enrich(&raw, lookup.as_ref())?;
    let path = ctx.store.save(&ctx.target, &findings)?;
    Ok(path)
}

fn publish(tx: &watch::Sender<WatcherState>, state: WatcherState) {
    // receivers may all be gone when the registry entry was replaced
    let _ = tx.send(state);
}
