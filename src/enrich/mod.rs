//! Enrichment Pipeline
//!
//! Pure transformation from the engine's raw CSV report into normalized
//! vulnerability findings. The pipeline selects a fixed column subset,
//! drops unusable rows, explodes comma-joined CVE lists into one row per
//! identifier, lowercases every field, synthesizes a single-line
//! description and left-joins an optional lookup corpus for access-vector,
//! access-complexity and exploit defaults.
//!
//! The transformation is deterministic and ordering-stable: output rows
//! follow the input row order, then token order within an exploded row.

pub mod error;
pub mod lookup;
pub mod pipeline;
pub mod types;

pub use error::{PipelineError, PipelineResult};
pub use lookup::{LookupEntry, LookupTable};
pub use pipeline::enrich;
pub use types::Finding;
