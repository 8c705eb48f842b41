//! CVE lookup corpus
//!
//! Optional read-only table keyed by CVE identifier, providing default
//! access-vector, access-complexity and exploit values for the enrichment
//! join. Absence of the corpus file is a valid, handled state.

use crate::enrich::error::{PipelineError, PipelineResult};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const COL_CVE_ID: &str = "cve_id";
const COL_ACCESS_VECTOR: &str = "access_vector";
const COL_ACCESS_COMPLEXITY: &str = "access_complexity";
const COL_EXPLOIT: &str = "exploit";

/// Per-CVE values pulled in by the left join. A matched CVE may still leave
/// individual fields empty; the pipeline default-fills those afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupEntry {
    pub access_vector: Option<String>,
    pub access_complexity: Option<String>,
    pub exploit: Option<String>,
}

/// Lookup corpus keyed by lowercase CVE identifier
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: HashMap<String, LookupEntry>,
}

impl LookupTable {
    /// Load the corpus from `path` if the file exists; `Ok(None)` when it
    /// does not.
    pub fn load_if_present(path: &Path) -> PipelineResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(path).map_err(|e| PipelineError::Malformed {
            message: format!("cannot open lookup corpus '{}': {}", path.display(), e),
        })?;
        Self::from_reader(file).map(Some)
    }

    /// Parse the corpus from CSV with columns cve_id, access_vector,
    /// access_complexity, exploit. Values are lowercased at load; empty
    /// cells become `None`.
    pub fn from_reader<R: Read>(reader: R) -> PipelineResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| PipelineError::Malformed {
                message: e.to_string(),
            })?
            .clone();

        let column = |name: &'static str| -> PipelineResult<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(PipelineError::MissingColumn { column: name })
        };
        let cve_col = column(COL_CVE_ID)?;
        let vector_col = column(COL_ACCESS_VECTOR)?;
        let complexity_col = column(COL_ACCESS_COMPLEXITY)?;
        let exploit_col = column(COL_EXPLOIT)?;

        let mut entries = HashMap::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| PipelineError::Malformed {
                message: e.to_string(),
            })?;
            let cell = |idx: usize| -> Option<String> {
                record
                    .get(idx)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_lowercase)
            };

            let Some(cve_id) = cell(cve_col) else {
                continue;
            };
            entries.insert(
                cve_id,
                LookupEntry {
                    access_vector: cell(vector_col),
                    access_complexity: cell(complexity_col),
                    exploit: cell(exploit_col),
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn get(&self, cve_id: &str) -> Option<&LookupEntry> {
        self.entries.get(cve_id)
    }

    pub fn insert(&mut self, cve_id: impl Into<String>, entry: LookupEntry) {
        self.entries.insert(cve_id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
