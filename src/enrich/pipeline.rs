//! Report enrichment pipeline

use crate::enrich::error::{PipelineError, PipelineResult};
use crate::enrich::lookup::LookupTable;
use crate::enrich::types::{
    Finding, DEFAULT_ACCESS_COMPLEXITY, DEFAULT_ACCESS_VECTOR, NULL_SENTINEL,
};
use once_cell::sync::Lazy;
use regex::Regex;

const COL_CVES: &str = "CVEs";
const COL_CVSS: &str = "CVSS";
const COL_IMPACT: &str = "Impact";
const COL_SOLUTION: &str = "Solution";
const COL_AFFECTED: &str = "Affected Software/OS";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Transform a raw CSV report into normalized findings.
///
/// Rows without a CVE identifier or a numeric CVSS score are dropped.
/// Comma-joined CVE lists are exploded into one finding per identifier, all
/// other fields duplicated across the exploded rows. When `lookup` is
/// `None`, access_vector/access_complexity/exploit take their fixed
/// defaults for every row; when present, unmatched CVEs and matched-but-
/// empty fields fall back to the same defaults after the join.
pub fn enrich(raw: &[u8], lookup: Option<&LookupTable>) -> PipelineResult<Vec<Finding>> {
    let mut reader = csv::Reader::from_reader(raw);
    let headers = reader
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
    let cves_col = column(COL_CVES)?;
    let cvss_col = column(COL_CVSS)?;
    let impact_col = column(COL_IMPACT)?;
    let solution_col = column(COL_SOLUTION)?;
    let affected_col = column(COL_AFFECTED)?;

    let mut findings = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::Malformed {
            message: e.to_string(),
        })?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let cve_raw = field(cves_col);
        let cvss_raw = field(cvss_col);
        if cve_raw.is_empty() || cvss_raw.is_empty() {
            continue;
        }
        let Ok(cvss_score) = cvss_raw.parse::<f64>() else {
            continue;
        };

        let impact = field(impact_col).to_lowercase();
        let solution = field(solution_col).to_lowercase();
        let affected = field(affected_col).to_lowercase();
        let description = synthesize_description(&affected, &impact);

        // strip internal whitespace, then one finding per comma token
        let compact = WHITESPACE.replace_all(cve_raw, "");
        for token in compact.split(',').filter(|t| !t.is_empty()) {
            let cve_id = token.to_lowercase();
            let entry = lookup.and_then(|table| table.get(&cve_id));

            findings.push(Finding {
                access_vector: entry
                    .and_then(|e| e.access_vector.clone())
                    .unwrap_or_else(|| DEFAULT_ACCESS_VECTOR.to_string()),
                access_complexity: entry
                    .and_then(|e| e.access_complexity.clone())
                    .unwrap_or_else(|| DEFAULT_ACCESS_COMPLEXITY.to_string()),
                exploit: entry
                    .and_then(|e| e.exploit.clone())
                    .unwrap_or_else(|| NULL_SENTINEL.to_string()),
                cve_id,
                cvss_score,
                description: description.clone(),
                solution: solution.clone(),
            });
        }
    }

    Ok(findings)
}

// affected_software + " " + impact, whitespace-collapsed to a single line;
// the null sentinel when nothing remains
fn synthesize_description(affected: &str, impact: &str) -> String {
    let joined = format!("{} {}", affected, impact);
    let collapsed = WHITESPACE.replace_all(joined.trim(), " ").into_owned();
    if collapsed.is_empty() {
        NULL_SENTINEL.to_string()
    } else {
        collapsed
    }
}
