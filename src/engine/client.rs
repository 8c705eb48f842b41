//! GMP client
//!
//! Builds GMP command documents, exchanges them through the transport and
//! parses the XML responses into typed results.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::transport::EngineTransport;
use crate::engine::types::TaskStatus;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::Arc;

/// Typed client for the engine's task/target/report lifecycle commands
pub struct GmpClient {
    transport: Arc<dyn EngineTransport>,
    port_list_id: String,
}

impl GmpClient {
    pub fn new(transport: Arc<dyn EngineTransport>, port_list_id: String) -> Self {
        Self {
            transport,
            port_list_id,
        }
    }

    /// Resolve a scan configuration id by its display name
    pub async fn scan_config_id(&self, name: &str) -> EngineResult<String> {
        self.named_id("<get_configs/>", "config", name)
            .await?
            .ok_or_else(|| EngineError::ScanConfigNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve a report format id by its display name
    pub async fn report_format_id(&self, name: &str) -> EngineResult<String> {
        self.named_id("<get_report_formats/>", "report_format", name)
            .await?
            .ok_or_else(|| EngineError::ReportFormatNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a target registered for the address, creating one if none
    /// exists. Idempotent: an address already known to the engine is reused
    /// rather than duplicated.
    pub async fn find_or_create_target(&self, address: &str) -> EngineResult<String> {
        let response = self.transport.exchange("<get_targets/>").await?;
        {
            let doc = parse_doc(&response)?;
            for target in doc.descendants().filter(|n| n.has_tag_name("target")) {
                let hosts = target
                    .children()
                    .find(|c| c.has_tag_name("hosts"))
                    .and_then(|c| c.text());
                if hosts == Some(address) {
                    if let Some(id) = target.attribute("id") {
                        log::debug!("reusing engine target {} for {}", id, address);
                        return Ok(id.to_string());
                    }
                }
            }
        }

        let command = format!(
            "<create_target><name>Target {address}</name><hosts>{address}</hosts>\
             <port_list id=\"{}\"/></create_target>",
            self.port_list_id
        );
        let response = self.transport.exchange(&command).await?;
        root_id(&response)
    }

    /// Create a task binding a target to a scan configuration
    pub async fn create_task(&self, target_id: &str, config_id: &str) -> EngineResult<String> {
        let command = format!(
            "<create_task><name>Scan Task {target_id}</name>\
             <config id=\"{config_id}\"/><target id=\"{target_id}\"/>\
             <schedule/></create_task>"
        );
        let response = self.transport.exchange(&command).await?;
        root_id(&response)
    }

    pub async fn start_task(&self, task_id: &str) -> EngineResult<()> {
        let command = format!("<start_task task_id=\"{task_id}\"/>");
        let response = self.transport.exchange(&command).await?;
        ensure_ok(&response, "start")
    }

    /// Current status and progress percentage of a task. A missing status
    /// field reads as `Unknown`, a missing progress field as 0.
    pub async fn task_status(&self, task_id: &str) -> EngineResult<(TaskStatus, i32)> {
        let command = format!("<get_tasks task_id=\"{task_id}\"/>");
        let response = self.transport.exchange(&command).await?;
        let doc = parse_doc(&response)?;

        let status = doc
            .descendants()
            .find(|n| n.has_tag_name("status"))
            .and_then(|n| n.text())
            .map(TaskStatus::parse)
            .unwrap_or(TaskStatus::Unknown);
        let progress = doc
            .descendants()
            .find(|n| n.has_tag_name("progress"))
            .and_then(|n| n.text())
            .and_then(|t| t.trim().parse().ok())
            .unwrap_or(0);

        Ok((status, progress))
    }

    /// Stop a running task. Valid only while the task is Running, Requested
    /// or Queued; afterwards the engine's confirmation must indicate a
    /// paused state or the stop is reported as rejected.
    pub async fn stop_task(&self, task_id: &str) -> EngineResult<()> {
        let (status, _) = self.task_status(task_id).await?;
        if !status.is_stoppable() {
            return Err(EngineError::InvalidTransition {
                operation: "pause",
                status,
            });
        }

        let command = format!("<stop_task task_id=\"{task_id}\"/>");
        let response = self.transport.exchange(&command).await?;
        let doc = parse_doc(&response)?;
        let status_text = doc
            .root_element()
            .attribute("status_text")
            .unwrap_or("")
            .to_string();
        if !status_text.contains("Paused") {
            return Err(EngineError::CommandRejected {
                operation: "pause",
                status_text,
            });
        }
        Ok(())
    }

    /// Resume a paused or stopped task
    pub async fn resume_task(&self, task_id: &str) -> EngineResult<()> {
        let (status, _) = self.task_status(task_id).await?;
        if !status.is_resumable() {
            return Err(EngineError::InvalidTransition {
                operation: "resume",
                status,
            });
        }

        let command = format!("<resume_task task_id=\"{task_id}\"/>");
        let response = self.transport.exchange(&command).await?;
        ensure_ok(&response, "resume")
    }

    /// Id of the last report produced by a task
    pub async fn report_id(&self, task_id: &str) -> EngineResult<String> {
        let command = format!("<get_tasks task_id=\"{task_id}\"/>");
        let response = self.transport.exchange(&command).await?;
        let doc = parse_doc(&response)?;

        doc.descendants()
            .filter(|n| n.has_tag_name("last_report"))
            .flat_map(|n| n.children())
            .find(|c| c.has_tag_name("report"))
            .and_then(|r| r.attribute("id"))
            .map(str::to_string)
            .ok_or_else(|| EngineError::ReportNotFound {
                task_id: task_id.to_string(),
            })
    }

    /// Fetch a report in the given format; the body arrives base64-encoded
    pub async fn fetch_report(&self, report_id: &str, format_id: &str) -> EngineResult<Vec<u8>> {
        let command = format!(
            "<get_reports report_id=\"{report_id}\" format_id=\"{format_id}\" details=\"1\"/>"
        );
        let response = self.transport.exchange(&command).await?;
        let doc = parse_doc(&response)?;

        let body = doc
            .descendants()
            .filter(|n| n.has_tag_name("report"))
            .find_map(|n| n.text().map(str::trim).filter(|t| !t.is_empty()))
            .ok_or(EngineError::EmptyReport)?;

        BASE64.decode(body).map_err(|e| EngineError::Protocol {
            message: format!("report body is not valid base64: {}", e),
        })
    }

    /// Find the id attribute of the first `element` whose `<name>` child
    /// matches `name`
    async fn named_id(
        &self,
        command: &str,
        element: &str,
        name: &str,
    ) -> EngineResult<Option<String>> {
        let response = self.transport.exchange(command).await?;
        let doc = parse_doc(&response)?;

        for node in doc.descendants().filter(|n| n.has_tag_name(element)) {
            let matches = node
                .children()
                .find(|c| c.has_tag_name("name"))
                .and_then(|c| c.text())
                .map(|t| t == name)
                .unwrap_or(false);
            if matches {
                if let Some(id) = node.attribute("id") {
                    return Ok(Some(id.to_string()));
                }
            }
        }
        Ok(None)
    }
}

fn parse_doc(response: &str) -> EngineResult<roxmltree::Document<'_>> {
    roxmltree::Document::parse(response).map_err(|e| EngineError::Protocol {
        message: format!("malformed engine response: {}", e),
    })
}

// Id attribute of the response root, e.g. <create_task_response id="...">
fn root_id(response: &str) -> EngineResult<String> {
    let doc = parse_doc(response)?;
    doc.root_element()
        .attribute("id")
        .map(str::to_string)
        .ok_or_else(|| EngineError::Protocol {
            message: "response carries no id attribute".to_string(),
        })
}

// GMP status attributes are HTTP-like; anything outside 2xx is a rejection
fn ensure_ok(response: &str, operation: &'static str) -> EngineResult<()> {
    let doc = parse_doc(response)?;
    let root = doc.root_element();
    if let Some(status) = root.attribute("status") {
        if !status.starts_with('2') {
            let status_text = root
                .attribute("status_text")
                .unwrap_or("command rejected")
                .to_string();
            return Err(EngineError::CommandRejected {
                operation,
                status_text,
            });
        }
    }
    Ok(())
}
