//! Enrichment pipeline error types

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The raw report lacks one of the required columns
    #[error("raw report is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    /// The raw report (or lookup corpus) is not readable as CSV
    #[error("tabular data is not parseable: {message}")]
    Malformed { message: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
