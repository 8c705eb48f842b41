//! Test helpers for scan orchestration tests
//!
//! Provides a mock engine transport that answers GMP commands with canned
//! responses. Task status responses are served from a queue whose last
//! entry is sticky, so an indefinitely Running scan can be scripted with a
//! single entry.

use crate::engine::error::EngineResult;
use crate::engine::transport::EngineTransport;
use crate::scan::manager::{ScanManager, ScanSettings};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A canned CSV report with one finding row
pub const SIMPLE_REPORT: &str = "\
IP,CVEs,CVSS,Impact,Solution,Affected Software/OS\n\
10.0.0.5,CVE-2023-0001,7.5,data loss,patch,WidgetApp 1.0\n";

/// A report lacking the required CVEs column
pub const BROKEN_REPORT: &str = "IP,CVSS,Impact,Solution,Affected Software/OS\n";

/// Status response for a task, optionally carrying a last report id
pub fn task_response(status: &str, progress: i32, with_report: bool) -> String {
    let last_report = if with_report {
        r#"<last_report><report id="rep-1"/></last_report>"#
    } else {
        ""
    };
    format!(
        "<get_tasks_response status=\"200\"><task id=\"task-1\">\
         <status>{status}</status><progress>{progress}</progress>{last_report}\
         </task></get_tasks_response>"
    )
}

pub struct MockTransport {
    task_responses: Mutex<VecDeque<String>>,
    report_csv: String,
    configs_response: String,
    create_task_count: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Transport whose `<get_tasks>` responses replay `statuses` in order,
    /// the last one repeating forever
    pub fn new(statuses: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            task_responses: Mutex::new(statuses.into()),
            report_csv: SIMPLE_REPORT.to_string(),
            configs_response: r#"
                <get_configs_response status="200">
                  <config id="cfg-1"><name>Full and fast</name></config>
                </get_configs_response>"#
                .to_string(),
            create_task_count: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        })
    }

    pub fn with_report_csv(self: Arc<Self>, csv: &str) -> Arc<Self> {
        let mut this = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("transport already shared"));
        this.report_csv = csv.to_string();
        Arc::new(this)
    }

    pub fn with_missing_config(self: Arc<Self>) -> Arc<Self> {
        let mut this = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("transport already shared"));
        this.configs_response = r#"<get_configs_response status="200"/>"#.to_string();
        Arc::new(this)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn command_count(&self, needle: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }

    fn next_task_response(&self) -> String {
        let mut queue = self.task_responses.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .expect("mock transport has no task responses scripted")
        }
    }
}

#[async_trait]
impl EngineTransport for MockTransport {
    async fn exchange(&self, command: &str) -> EngineResult<String> {
        self.commands.lock().unwrap().push(command.to_string());

        if command.starts_with("<get_configs") {
            return Ok(self.configs_response.clone());
        }
        if command.starts_with("<get_report_formats") {
            return Ok(r#"
                <get_report_formats_response status="200">
                  <report_format id="fmt-csv"><name>CSV Results</name></report_format>
                </get_report_formats_response>"#
                .to_string());
        }
        if command.starts_with("<get_targets") {
            return Ok(r#"<get_targets_response status="200"/>"#.to_string());
        }
        if command.starts_with("<create_target") {
            return Ok(r#"<create_target_response status="201" id="tgt-1"/>"#.to_string());
        }
        if command.starts_with("<create_task") {
            let n = self.create_task_count.fetch_add(1, Ordering::SeqCst) + 1;
            return Ok(format!(
                r#"<create_task_response status="201" id="task-{n}"/>"#
            ));
        }
        if command.starts_with("<start_task") {
            return Ok(r#"<start_task_response status="202"/>"#.to_string());
        }
        if command.starts_with("<get_tasks") {
            return Ok(self.next_task_response());
        }
        if command.starts_with("<get_reports") {
            let body = BASE64.encode(&self.report_csv);
            return Ok(format!(
                r#"<get_reports_response status="200"><report id="rep-1">{body}</report></get_reports_response>"#
            ));
        }
        if command.starts_with("<stop_task") {
            return Ok(
                r#"<stop_task_response status="200" status_text="OK, Paused"/>"#.to_string(),
            );
        }
        if command.starts_with("<resume_task") {
            return Ok(r#"<resume_task_response status="202"/>"#.to_string());
        }
        panic!("mock transport received unexpected command: {command}");
    }
}

/// Settings tuned for tests: millisecond polling, results in `result_dir`
pub fn test_settings(result_dir: &Path) -> ScanSettings {
    ScanSettings {
        config_name: "Full and fast".to_string(),
        report_format_name: "CSV Results".to_string(),
        port_list_id: "port-list-1".to_string(),
        poll_interval: Duration::from_millis(2),
        max_poll_attempts: 1000,
        result_dir: result_dir.to_path_buf(),
        lookup_path: result_dir.join("lookup_corpus.csv"),
    }
}

pub fn manager_with(
    transport: Arc<MockTransport>,
    settings: ScanSettings,
) -> ScanManager {
    ScanManager::new(transport, settings)
}
