//! Normalized finding store
//!
//! Whole-file CSV persistence keyed by a normalized target identifier.
//! Writes go through a same-directory temporary file and an atomic rename,
//! so readers never observe a torn file; the last completed write wins.

use crate::enrich::types::Finding;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("finding store I/O failure: {message}")]
    Io { message: String },

    #[error("stored findings for '{target}' are malformed: {message}")]
    Malformed { target: String, message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Per-target result store rooted at a directory
#[derive(Debug, Clone)]
pub struct FindingStore {
    root: PathBuf,
}

impl FindingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Normalize a target identifier into a filesystem-safe key
    pub fn storage_key(target: &str) -> String {
        target
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    /// Path the findings for `target` are stored at
    pub fn path_for(&self, target: &str) -> PathBuf {
        self.root.join(format!("{}.csv", Self::storage_key(target)))
    }

    pub fn exists(&self, target: &str) -> bool {
        self.path_for(target).exists()
    }

    /// Persist the findings for a target, replacing any previous file
    pub fn save(&self, target: &str, findings: &[Finding]) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::Io {
            message: format!("cannot create '{}': {}", self.root.display(), e),
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(|e| StoreError::Io {
            message: e.to_string(),
        })?;
        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            for finding in findings {
                writer.serialize(finding).map_err(|e| StoreError::Io {
                    message: e.to_string(),
                })?;
            }
            writer.flush().map_err(|e| StoreError::Io {
                message: e.to_string(),
            })?;
        }

        let path = self.path_for(target);
        tmp.persist(&path).map_err(|e| StoreError::Io {
            message: e.to_string(),
        })?;
        Ok(path)
    }

    /// Load the findings for a target; `Ok(None)` when none are stored
    pub fn load(&self, target: &str) -> StoreResult<Option<Vec<Finding>>> {
        let path = self.path_for(target);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| StoreError::Io {
            message: e.to_string(),
        })?;
        let mut findings = Vec::new();
        for row in reader.deserialize() {
            let finding: Finding = row.map_err(|e| StoreError::Malformed {
                target: target.to_string(),
                message: e.to_string(),
            })?;
            findings.push(finding);
        }
        Ok(Some(findings))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
