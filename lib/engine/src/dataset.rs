//! Loading cleaned historical cases for training.
//!
//! Rows are expected to be cleaned upstream (missing numbers already
//! filled); this module only fills absent case ids and drops empty text.

use aidx_core::{Case, Decision, Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CaseRow {
    #[serde(default)]
    case_id: Option<String>,
    income: f64,
    family_members: u32,
    #[serde(default)]
    enquiry_feedback: Option<String>,
    #[serde(default)]
    verification_notes: Option<String>,
    #[serde(default)]
    decision_officer_comment: Option<String>,
    final_decision: Decision,
    #[serde(default)]
    aid_amount: Option<f64>,
}

/// Parse a JSON array of case rows
pub fn parse_cases(json: &str) -> Result<Vec<Case>> {
    let rows: Vec<CaseRow> =
        serde_json::from_str(json).map_err(|e| Error::Serialization(format!("case rows: {}", e)))?;

    Ok(rows.into_iter().enumerate().map(into_case).collect())
}

/// Parse delimited case rows with a header line naming the columns.
/// Extra columns are ignored.
pub fn parse_cases_csv<R: Read>(reader: R) -> Result<Vec<Case>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut cases = Vec::new();
    for (i, row) in reader.deserialize::<CaseRow>().enumerate() {
        let row = row.map_err(|e| Error::Serialization(format!("case row {}: {}", i + 1, e)))?;
        cases.push(into_case((i, row)));
    }
    Ok(cases)
}

/// Load cases from `path`: `.csv` files are read as delimited rows,
/// anything else as a JSON array.
pub fn load_cases<P: AsRef<Path>>(path: P) -> Result<Vec<Case>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let cases = if is_csv {
        parse_cases_csv(File::open(path)?)?
    } else {
        parse_cases(&std::fs::read_to_string(path)?)?
    };
    debug!(path = %path.display(), cases = cases.len(), "loaded historical cases");
    Ok(cases)
}

fn into_case((i, row): (usize, CaseRow)) -> Case {
    Case {
        case_id: non_empty(row.case_id).unwrap_or_else(|| format!("case-{:05}", i + 1)),
        income: row.income,
        family_members: row.family_members,
        enquiry_feedback: non_empty(row.enquiry_feedback),
        verification_notes: non_empty(row.verification_notes),
        decision_officer_comment: non_empty(row.decision_officer_comment),
        final_decision: row.final_decision,
        aid_amount: row.aid_amount,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
