//! Scan request and result types.

use crate::filter::{Candidate, TypeCheck};
use crate::types::TableRef;
use serde::{Deserialize, Serialize};

/// How a column value is compared with the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The value contains the search text anywhere.
    #[default]
    Contains,
    /// The value equals the search text.
    Exact,
}

impl MatchMode {
    /// In-process evaluation, used where no engine is involved.
    pub fn matches(self, value: &str, needle: &str) -> bool {
        match self {
            Self::Contains => value.contains(needle),
            Self::Exact => value == needle,
        }
    }
}

/// Everything a value scan needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub table: TableRef,
    pub search: String,
    pub candidate_a: Candidate,
    pub candidate_b: Candidate,
    #[serde(default)]
    pub excluded_columns: Vec<String>,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub type_check: TypeCheck,
}

impl ScanRequest {
    pub fn new(
        table: TableRef,
        search: impl Into<String>,
        candidate_a: Candidate,
        candidate_b: Candidate,
    ) -> Self {
        Self {
            table,
            search: search.into(),
            candidate_a,
            candidate_b,
            excluded_columns: Vec::new(),
            match_mode: MatchMode::default(),
            type_check: TypeCheck::default(),
        }
    }

    pub fn excluding(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_type_check(mut self, type_check: TypeCheck) -> Self {
        self.type_check = type_check;
        self
    }
}

/// A column that holds at least one qualifying match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub column_name: String,
    pub match_count: u64,
}

impl MatchResult {
    pub fn new(column_name: impl Into<String>, match_count: u64) -> Self {
        Self {
            column_name: column_name.into(),
            match_count,
        }
    }
}

/// Whether a candidate column was found on the target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStatus {
    pub column: String,
    pub present: bool,
}

/// What the scan detected and used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDiagnostics {
    pub target_table: String,
    pub candidate_a: CandidateStatus,
    pub candidate_b: CandidateStatus,
    /// Effective filter, e.g. `ProcessNumber = '10402'`.
    pub row_filter: String,
    pub search_value: String,
    pub match_mode: MatchMode,
    /// Character columns eligible for the scan.
    pub columns_considered: usize,
    /// Columns actually queried (zero when the filter matches nothing).
    pub columns_probed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result of a value scan: matches sorted by column name plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub diagnostics: ScanDiagnostics,
    pub matches: Vec<MatchResult>,
}

impl ScanReport {
    pub fn total_matches(&self) -> u64 {
        self.matches.iter().map(|m| m.match_count).sum()
    }
}
