//! Column-existence resolution and row-filter construction.
//!
//! Two candidate columns, each paired with a literal, are looked up in the
//! catalog snapshot. Which of them exist decides one of four filter shapes:
//!
//! | A present | B present | Filter                         |
//! |-----------|-----------|--------------------------------|
//! | yes       | yes       | `A = a OR B = b`               |
//! | yes       | no        | `A = a`                        |
//! | no        | yes       | `B = b`                        |
//! | no        | no        | always false, nothing is read  |

use crate::error::ScanError;
use crate::types::{CatalogSnapshot, ColumnDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "tracing")]
use tracing::warn;

/// A comparison literal. Always sent to the database as a bound parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Literal {
    Text(String),
    Integer(i64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl FromStr for Literal {
    type Err = String;

    /// `'quoted'` is text (with `''` as an escaped quote), a bare integer is an
    /// integer, anything else is rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
            return Ok(Self::Text(raw[1..raw.len() - 1].replace("''", "'")));
        }
        raw.parse::<i64>().map(Self::Integer).map_err(|_| {
            format!("literal must be a quoted string ('text') or an integer, got: {raw}")
        })
    }
}

/// A candidate filter column and the literal it must equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub column: String,
    pub literal: Literal,
}

impl Candidate {
    pub fn new(column: impl Into<String>, literal: Literal) -> Self {
        Self {
            column: column.into(),
            literal,
        }
    }

    pub fn text(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, Literal::Text(value.into()))
    }

    pub fn integer(column: impl Into<String>, value: i64) -> Self {
        Self::new(column, Literal::Integer(value))
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.literal)
    }
}

impl FromStr for Candidate {
    type Err = String;

    /// Parses `Column='text'` or `Column=123`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (column, literal) = raw
            .split_once('=')
            .ok_or_else(|| format!("expected COLUMN=LITERAL, got: {raw}"))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(format!("candidate column name is empty in: {raw}"));
        }
        Ok(Self::new(column, literal.parse()?))
    }
}

/// Row filter derived from which candidate columns exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "shape")]
pub enum FilterClause {
    /// `a OR b`
    Both { a: Candidate, b: Candidate },
    /// A single equality.
    Single { candidate: Candidate },
    /// Always false, so the scan never reads the table unrestricted.
    MatchNone,
}

impl FilterClause {
    /// Candidates referenced by the filter, in render order.
    pub fn candidates(&self) -> Vec<&Candidate> {
        match self {
            Self::Both { a, b } => vec![a, b],
            Self::Single { candidate } => vec![candidate],
            Self::MatchNone => Vec::new(),
        }
    }

    pub fn matches_nothing(&self) -> bool {
        matches!(self, Self::MatchNone)
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Both { a, b } => write!(f, "{a} OR {b}"),
            Self::Single { candidate } => write!(f, "{candidate}"),
            Self::MatchNone => f.write_str("1 = 0"),
        }
    }
}

/// How literal/column type mismatches are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCheck {
    /// Compare anyway and leave conversion to the engine; mismatches are
    /// reported as warnings.
    #[default]
    Permissive,
    /// Refuse to run when a literal cannot be compared with its column.
    Strict,
}

/// Picks the filter shape from the two presence flags.
pub fn build_filter(a_present: bool, b_present: bool, a: Candidate, b: Candidate) -> FilterClause {
    match (a_present, b_present) {
        (true, true) => FilterClause::Both { a, b },
        (true, false) => FilterClause::Single { candidate: a },
        (false, true) => FilterClause::Single { candidate: b },
        (false, false) => FilterClause::MatchNone,
    }
}

/// Outcome of resolving the candidates against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub clause: FilterClause,
    pub a_present: bool,
    pub b_present: bool,
    /// Candidate columns whose literal does not fit the declared type.
    pub mismatched: Vec<String>,
    pub warnings: Vec<String>,
}

/// Looks both candidates up in `snapshot` and builds the filter.
///
/// With [`TypeCheck::Strict`] an incompatible literal is an error; otherwise
/// its column is listed in `mismatched` and a warning is returned.
pub fn resolve_filter(
    snapshot: &CatalogSnapshot,
    a: &Candidate,
    b: &Candidate,
    type_check: TypeCheck,
) -> Result<ResolvedFilter, ScanError> {
    let mut mismatched = Vec::new();
    let mut warnings = Vec::new();

    let a_column = snapshot.column(&a.column);
    let b_column = snapshot.column(&b.column);

    for (candidate, column) in [(a, a_column), (b, b_column)] {
        let Some(column) = column else {
            continue;
        };
        if literal_is_compatible(column, &candidate.literal) {
            continue;
        }
        if type_check == TypeCheck::Strict {
            return Err(ScanError::IncompatibleLiteral {
                column: column.name.clone(),
                declared_type: column.declared_type.to_string(),
                literal: candidate.literal.to_string(),
            });
        }
        let message = format!(
            "literal {} is compared with column '{}' declared as {}; both sides are converted before comparing",
            candidate.literal, column.name, column.declared_type
        );
        #[cfg(feature = "tracing")]
        warn!(column = %column.name, "{message}");
        mismatched.push(column.name.clone());
        warnings.push(message);
    }

    Ok(ResolvedFilter {
        clause: build_filter(a_column.is_some(), b_column.is_some(), a.clone(), b.clone()),
        a_present: a_column.is_some(),
        b_present: b_column.is_some(),
        mismatched,
        warnings,
    })
}

fn literal_is_compatible(column: &ColumnDescriptor, literal: &Literal) -> bool {
    match literal {
        Literal::Integer(_) => !column.declared_type.is_character(),
        Literal::Text(_) => !column.declared_type.is_numeric(),
    }
}
