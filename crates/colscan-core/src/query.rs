//! Rendering of the per-column count statement.
//!
//! Identifiers come from the catalog snapshot and are quoted for the dialect.
//! The search text and the filter literals are returned as parameters, in
//! placeholder order, and never appear in the statement text.

use crate::dialect::Dialect;
use crate::filter::{FilterClause, Literal};
use crate::types::{ColumnDescriptor, MatchMode, TableRef};

/// A statement plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<Literal>,
}

/// One column to count matches in.
#[derive(Debug, Clone, Copy)]
pub struct ColumnProbe<'a> {
    pub table: &'a TableRef,
    pub column: &'a ColumnDescriptor,
    pub search: &'a str,
    pub match_mode: MatchMode,
    pub filter: &'a FilterClause,
    /// Filter columns whose literal has a different type than the column.
    pub mismatched: &'a [String],
}

/// Renders `filter` with placeholders numbered from `first_index`.
///
/// Columns named in `mismatched` are compared through
/// [`Dialect::mixed_type_equality`].
pub fn render_filter(
    dialect: Dialect,
    filter: &FilterClause,
    first_index: usize,
    mismatched: &[String],
) -> (String, Vec<Literal>) {
    let equality = |column: &str, index: usize| {
        let column_sql = dialect.quote_ident(column);
        let param = dialect.placeholder(index);
        if mismatched.iter().any(|name| name == column) {
            dialect.mixed_type_equality(&column_sql, &param)
        } else {
            format!("{column_sql} = {param}")
        }
    };

    match filter {
        FilterClause::Both { a, b } => (
            format!(
                "({} OR {})",
                equality(&a.column, first_index),
                equality(&b.column, first_index + 1)
            ),
            vec![a.literal.clone(), b.literal.clone()],
        ),
        FilterClause::Single { candidate } => (
            equality(&candidate.column, first_index),
            vec![candidate.literal.clone()],
        ),
        FilterClause::MatchNone => ("1 = 0".to_string(), Vec::new()),
    }
}

/// Renders the match predicate for one column against placeholder `index`.
pub fn render_match(dialect: Dialect, column_sql: &str, mode: MatchMode, index: usize) -> String {
    let param = dialect.placeholder(index);
    match mode {
        MatchMode::Contains => dialect.contains_predicate(column_sql, &param),
        MatchMode::Exact => format!("{column_sql} = {param}"),
    }
}

/// `SELECT COUNT(*)` of rows where the column matches and the filter holds.
pub fn count_query(dialect: Dialect, probe: &ColumnProbe<'_>) -> BoundQuery {
    let column_sql = dialect.quote_ident(&probe.column.name);
    let predicate = render_match(dialect, &column_sql, probe.match_mode, 1);
    let (filter_sql, filter_params) = render_filter(dialect, probe.filter, 2, probe.mismatched);

    let sql = format!(
        "SELECT COUNT(*) AS match_count FROM {} WHERE {} AND {}",
        dialect.quote_table(probe.table),
        predicate,
        filter_sql
    );

    let mut params = Vec::with_capacity(1 + filter_params.len());
    params.push(Literal::Text(probe.search.to_string()));
    params.extend(filter_params);

    BoundQuery { sql, params }
}
