//! Process startup
//!
//! Parses the command line, initializes logging and configuration, builds
//! the async runtime and dispatches the selected command.

use crate::app::cli::{Cli, Command};
use crate::core::config::Config;
use crate::core::logging::init_logging;
use crate::engine::client::GmpClient;
use crate::engine::transport::GvmCliTransport;
use crate::enrich::types::Finding;
use crate::scan::manager::{ScanManager, ScanSettings};
use crate::scan::types::WatcherPhase;
use crate::store::FindingStore;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(
        cli.log_level.as_deref(),
        cli.log_format.as_deref(),
        cli.log_file.as_deref(),
    ) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("failed to build async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli.command, &config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command, config: &Config) -> AppResult<()> {
    match command {
        Command::Scan { target } => scan(&target, config).await,
        Command::Report { target, json } => report(&target, config, json),
        Command::Status { task_id, json } => status(&task_id, config, json).await,
        Command::Pause { task_id } => {
            engine_client(config).stop_task(&task_id).await?;
            println!("task {task_id} paused");
            Ok(())
        }
        Command::Resume { task_id } => {
            engine_client(config).resume_task(&task_id).await?;
            println!("task {task_id} resumed");
            Ok(())
        }
    }
}

/// Start a scan and block until its watcher finishes. Ctrl-C cancels the
/// watcher; the engine-side task is left running and can be resumed into a
/// later `scan` invocation.
async fn scan(target: &str, config: &Config) -> AppResult<()> {
    let transport = Arc::new(GvmCliTransport::from_config(&config.engine));
    let manager = ScanManager::new(transport, ScanSettings::from(config));

    let task_id = manager.start(target).await?;
    println!("scan started for {target} (task {task_id})");

    let wait = manager.wait(target);
    tokio::pin!(wait);

    let phase = tokio::select! {
        phase = &mut wait => phase?,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupt received, stopping watcher for {target}");
            manager.cancel(target)?;
            wait.await?
        }
    };

    match phase {
        WatcherPhase::Completed => {
            println!(
                "enriched report saved to {}",
                manager.report_path(target).display()
            );
            Ok(())
        }
        WatcherPhase::Cancelled => {
            println!("scan watcher cancelled; task {task_id} keeps running on the engine");
            Ok(())
        }
        WatcherPhase::TimedOut => Err(format!("scan for {target} did not finish in time").into()),
        WatcherPhase::Failed => Err(format!("scan for {target} failed; see log").into()),
        WatcherPhase::Polling => unreachable!("wait returned a non-terminal phase"),
    }
}

fn report(target: &str, config: &Config, json: bool) -> AppResult<()> {
    let store = FindingStore::new(&config.scan.result_dir);
    let findings = store
        .load(target)?
        .ok_or_else(|| format!("no stored report for {target}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        print_findings(&findings);
    }
    Ok(())
}

async fn status(task_id: &str, config: &Config, json: bool) -> AppResult<()> {
    let (status, progress) = engine_client(config).task_status(task_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "task_id": task_id,
                "status": status.to_string(),
                "progress": progress,
            })
        );
    } else {
        println!("task {task_id}: {status} ({progress}%)");
    }
    Ok(())
}

fn print_findings(findings: &[Finding]) {
    for finding in findings {
        println!(
            "{}  cvss {:.1}  {}/{}  exploit: {}  solution: {}\n    {}",
            finding.cve_id,
            finding.cvss_score,
            finding.access_vector,
            finding.access_complexity,
            finding.exploit,
            finding.solution,
            finding.description,
        );
    }
}

fn engine_client(config: &Config) -> GmpClient {
    let transport = Arc::new(GvmCliTransport::from_config(&config.engine));
    GmpClient::new(transport, config.engine.port_list_id.clone())
}
