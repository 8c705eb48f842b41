//! Engine client tests against a scripted transport

use crate::engine::client::GmpClient;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::transport::EngineTransport;
use crate::engine::types::TaskStatus;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Transport that replays canned responses in order and records the
/// commands it was given
struct ScriptedTransport {
    responses: Mutex<VecDeque<EngineResult<String>>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<EngineResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            commands: Mutex::new(Vec::new()),
        })
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl EngineTransport for ScriptedTransport {
    async fn exchange(&self, command: &str) -> EngineResult<String> {
        self.commands.lock().unwrap().push(command.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted transport ran out of responses")
    }
}

fn client(transport: Arc<ScriptedTransport>) -> GmpClient {
    GmpClient::new(transport, "port-list-1".to_string())
}

fn task_response(status: &str, progress: i32) -> String {
    format!(
        "<get_tasks_response status=\"200\"><task id=\"task-1\">\
         <status>{status}</status><progress>{progress}</progress>\
         </task></get_tasks_response>"
    )
}

#[tokio::test]
async fn scan_config_id_matches_by_name() {
    let transport = ScriptedTransport::new(vec![Ok(r#"
        <get_configs_response status="200">
          <config id="cfg-discovery"><name>Discovery</name></config>
          <config id="cfg-full"><name>Full and fast</name></config>
        </get_configs_response>"#
        .to_string())]);
    let client = client(transport);

    let id = client.scan_config_id("Full and fast").await.unwrap();
    assert_eq!(id, "cfg-full");
}

#[tokio::test]
async fn scan_config_id_reports_missing_name() {
    let transport = ScriptedTransport::new(vec![Ok(
        r#"<get_configs_response status="200"/>"#.to_string()
    )]);
    let client = client(transport);

    let err = client.scan_config_id("Full and fast").await.unwrap_err();
    assert!(matches!(err, EngineError::ScanConfigNotFound { name } if name == "Full and fast"));
}

#[tokio::test]
async fn report_format_id_matches_by_name() {
    let transport = ScriptedTransport::new(vec![Ok(r#"
        <get_report_formats_response status="200">
          <report_format id="fmt-csv"><name>CSV Results</name></report_format>
        </get_report_formats_response>"#
        .to_string())]);
    let client = client(transport);

    let id = client.report_format_id("CSV Results").await.unwrap();
    assert_eq!(id, "fmt-csv");
}

#[tokio::test]
async fn find_or_create_target_reuses_existing_registration() {
    let transport = ScriptedTransport::new(vec![Ok(r#"
        <get_targets_response status="200">
          <target id="tgt-1"><hosts>10.0.0.5</hosts></target>
          <target id="tgt-2"><hosts>10.0.0.6</hosts></target>
        </get_targets_response>"#
        .to_string())]);
    let client = client(Arc::clone(&transport));

    let id = client.find_or_create_target("10.0.0.6").await.unwrap();
    assert_eq!(id, "tgt-2");
    // no create_target command was issued
    assert_eq!(transport.commands().len(), 1);
}

#[tokio::test]
async fn find_or_create_target_creates_when_absent() {
    let transport = ScriptedTransport::new(vec![
        Ok(r#"<get_targets_response status="200"/>"#.to_string()),
        Ok(r#"<create_target_response status="201" id="tgt-new"/>"#.to_string()),
    ]);
    let client = client(Arc::clone(&transport));

    let id = client.find_or_create_target("10.0.0.7").await.unwrap();
    assert_eq!(id, "tgt-new");

    let commands = transport.commands();
    assert!(commands[1].contains("<create_target>"));
    assert!(commands[1].contains("<hosts>10.0.0.7</hosts>"));
    assert!(commands[1].contains("port_list id=\"port-list-1\""));
}

#[tokio::test]
async fn task_status_parses_status_and_progress() {
    let transport = ScriptedTransport::new(vec![Ok(task_response("Running", 42))]);
    let client = client(transport);

    let (status, progress) = client.task_status("task-1").await.unwrap();
    assert_eq!(status, TaskStatus::Running);
    assert_eq!(progress, 42);
}

#[tokio::test]
async fn task_status_defaults_missing_fields() {
    let transport = ScriptedTransport::new(vec![Ok(
        r#"<get_tasks_response status="200"><task id="task-1"/></get_tasks_response>"#.to_string(),
    )]);
    let client = client(transport);

    let (status, progress) = client.task_status("task-1").await.unwrap();
    assert_eq!(status, TaskStatus::Unknown);
    assert_eq!(progress, 0);
}

#[tokio::test]
async fn unrecognized_status_text_maps_to_unknown() {
    let transport = ScriptedTransport::new(vec![Ok(task_response("Deliberating", 0))]);
    let client = client(transport);

    let (status, _) = client.task_status("task-1").await.unwrap();
    assert_eq!(status, TaskStatus::Unknown);
}

#[tokio::test]
async fn stop_task_refuses_invalid_transition() {
    let transport = ScriptedTransport::new(vec![Ok(task_response("Done", 100))]);
    let client = client(Arc::clone(&transport));

    let err = client.stop_task("task-1").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition {
            operation: "pause",
            status: TaskStatus::Done,
        }
    ));
    // the stop command itself was never issued
    assert_eq!(transport.commands().len(), 1);
}

#[tokio::test]
async fn stop_task_detects_unconfirmed_stop() {
    let transport = ScriptedTransport::new(vec![
        Ok(task_response("Running", 50)),
        Ok(r#"<stop_task_response status="400" status_text="Permission denied"/>"#.to_string()),
    ]);
    let client = client(transport);

    let err = client.stop_task("task-1").await.unwrap_err();
    assert!(matches!(err, EngineError::CommandRejected { operation: "pause", .. }));
}

#[tokio::test]
async fn stop_task_accepts_paused_confirmation() {
    let transport = ScriptedTransport::new(vec![
        Ok(task_response("Running", 50)),
        Ok(r#"<stop_task_response status="200" status_text="OK, Paused"/>"#.to_string()),
    ]);
    let client = client(transport);

    client.stop_task("task-1").await.unwrap();
}

#[tokio::test]
async fn stop_task_rejects_confirmation_without_paused_state() {
    let transport = ScriptedTransport::new(vec![
        Ok(task_response("Running", 50)),
        Ok(r#"<stop_task_response status="200" status_text="OK, Stopped"/>"#.to_string()),
    ]);
    let client = client(transport);

    let err = client.stop_task("task-1").await.unwrap_err();
    assert!(matches!(err, EngineError::CommandRejected { operation: "pause", .. }));
}

#[tokio::test]
async fn resume_task_refuses_running_task() {
    let transport = ScriptedTransport::new(vec![Ok(task_response("Running", 50))]);
    let client = client(transport);

    let err = client.resume_task("task-1").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition {
            operation: "resume",
            status: TaskStatus::Running,
        }
    ));
}

#[tokio::test]
async fn resume_task_accepts_stopped_task() {
    let transport = ScriptedTransport::new(vec![
        Ok(task_response("Stopped", 50)),
        Ok(r#"<resume_task_response status="202"/>"#.to_string()),
    ]);
    let client = client(transport);

    client.resume_task("task-1").await.unwrap();
}

#[tokio::test]
async fn report_id_reads_last_report() {
    let transport = ScriptedTransport::new(vec![Ok(r#"
        <get_tasks_response status="200">
          <task id="task-1"><status>Done</status>
            <last_report><report id="rep-9"/></last_report>
          </task>
        </get_tasks_response>"#
        .to_string())]);
    let client = client(transport);

    let id = client.report_id("task-1").await.unwrap();
    assert_eq!(id, "rep-9");
}

#[tokio::test]
async fn report_id_missing_is_not_found() {
    let transport = ScriptedTransport::new(vec![Ok(task_response("Done", 100))]);
    let client = client(transport);

    let err = client.report_id("task-1").await.unwrap_err();
    assert!(matches!(err, EngineError::ReportNotFound { task_id } if task_id == "task-1"));
}

#[tokio::test]
async fn fetch_report_decodes_base64_body() {
    let body = BASE64.encode("CVEs,CVSS\n");
    let transport = ScriptedTransport::new(vec![Ok(format!(
        r#"<get_reports_response status="200"><report id="rep-9">{body}</report></get_reports_response>"#
    ))]);
    let client = client(transport);

    let raw = client.fetch_report("rep-9", "fmt-csv").await.unwrap();
    assert_eq!(raw, b"CVEs,CVSS\n");
}

#[tokio::test]
async fn fetch_report_empty_body_is_an_error() {
    let transport = ScriptedTransport::new(vec![Ok(
        r#"<get_reports_response status="200"><report id="rep-9"></report></get_reports_response>"#
            .to_string(),
    )]);
    let client = client(transport);

    let err = client.fetch_report("rep-9", "fmt-csv").await.unwrap_err();
    assert!(matches!(err, EngineError::EmptyReport));
}

#[tokio::test]
async fn transport_failures_stay_distinct_from_protocol_errors() {
    let transport = ScriptedTransport::new(vec![
        Err(EngineError::Transport {
            message: "connection refused".to_string(),
        }),
        Ok("<not-xml".to_string()),
    ]);
    let client = client(transport);

    let err = client.task_status("task-1").await.unwrap_err();
    assert!(matches!(err, EngineError::Transport { .. }));

    let err = client.task_status("task-1").await.unwrap_err();
    assert!(matches!(err, EngineError::Protocol { .. }));
}
