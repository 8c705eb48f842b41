//! Normalized finding record

use serde::{Deserialize, Serialize};

/// Default access vector for CVEs absent from the lookup corpus
pub const DEFAULT_ACCESS_VECTOR: &str = "network";
/// Default access complexity for CVEs absent from the lookup corpus
pub const DEFAULT_ACCESS_COMPLEXITY: &str = "medium";
/// Sentinel for text fields with no usable content
pub const NULL_SENTINEL: &str = "null";

/// One normalized vulnerability finding.
///
/// Invariants: exactly one CVE identifier per record; `description` is a
/// non-empty single-line string with collapsed whitespace; all text fields
/// are lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub cve_id: String,
    pub cvss_score: f64,
    pub description: String,
    pub access_vector: String,
    pub access_complexity: String,
    pub exploit: String,
    pub solution: String,
}
