//! Engine client error types

use crate::engine::types::TaskStatus;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine process could not be reached or failed outright
    #[error("engine transport failure: {message}")]
    Transport { message: String },

    /// The engine answered, but the exchange violated the protocol
    #[error("engine protocol error: {message}")]
    Protocol { message: String },

    /// A lifecycle command was issued in a state that does not allow it
    #[error("cannot {operation} task while in '{status}' state")]
    InvalidTransition {
        operation: &'static str,
        status: TaskStatus,
    },

    /// The engine accepted the command transport-wise but did not produce
    /// the expected state
    #[error("engine rejected {operation}: {status_text}")]
    CommandRejected {
        operation: &'static str,
        status_text: String,
    },

    #[error("scan config '{name}' not found on the engine")]
    ScanConfigNotFound { name: String },

    #[error("report format '{name}' not found on the engine")]
    ReportFormatNotFound { name: String },

    #[error("no report associated with task {task_id}")]
    ReportNotFound { task_id: String },

    #[error("engine returned an empty report body")]
    EmptyReport,
}

pub type EngineResult<T> = Result<T, EngineError>;
