//! Claim status normalization

use crate::types::CellValue;
use std::fmt;

const OPEN_SYNONYMS: [&str; 5] = ["opened", "reopen", "re-open", "re opened", "reopened"];
const CLOSED_SYNONYMS: [&str; 4] = ["close", "reclosed", "re-closed", "re closed"];

/// Two-valued claim category, plus Unknown for anything unrecognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClaimStatus {
    Open,
    Closed,
    Unknown,
}

impl ClaimStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::Open => "Open",
            ClaimStatus::Closed => "Closed",
            ClaimStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify free-text status: synonym lists first, then substring match
///
/// Synonyms are compared after lowercasing, so `Close` and `Opened` match too.
pub fn normalize_status(raw: &str) -> ClaimStatus {
    let status = raw.trim().to_lowercase();

    if OPEN_SYNONYMS.contains(&status.as_str()) {
        ClaimStatus::Open
    } else if CLOSED_SYNONYMS.contains(&status.as_str()) {
        ClaimStatus::Closed
    } else if status.contains("open") {
        ClaimStatus::Open
    } else if status.contains("closed") {
        ClaimStatus::Closed
    } else {
        ClaimStatus::Unknown
    }
}

pub fn normalize_cell(cell: &CellValue) -> ClaimStatus {
    match cell {
        CellValue::Text(s) => normalize_status(s),
        other => normalize_status(&other.to_string()),
    }
}
