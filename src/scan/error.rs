//! Scan orchestration error types

use crate::engine::error::EngineError;
use crate::enrich::error::PipelineError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A live watcher already exists for the target
    #[error("a scan is already in progress for target '{target}'")]
    ScanInProgress { target: String },

    /// No scan task registered for the target
    #[error("no scan task registered for target '{target}'")]
    TaskNotFound { target: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal synchronisation error: {message}")]
    Internal { message: String },
}

pub type ScanResult<T> = Result<T, ScanError>;
