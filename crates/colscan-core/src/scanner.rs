//! The value scan and the key enumerations.
//!
//! Both are written against two small traits so the same logic runs over a
//! live connection or an in-memory table. Catalog reads happen once; every
//! identifier used afterwards is taken from that snapshot.

use crate::error::ScanError;
use crate::filter::resolve_filter;
use crate::query::ColumnProbe;
use crate::types::{
    CandidateStatus, CatalogColumn, CatalogSnapshot, ForeignKeyRow, MatchResult, PrimaryKeyRow,
    ScanDiagnostics, ScanReport, ScanRequest, TableRef,
};
#[cfg(feature = "tracing")]
use tracing::{debug, info, info_span};

/// Read access to the database catalog.
pub trait CatalogSource {
    /// Columns of `table`, or `None` when the table does not exist.
    fn load_table(&self, table: &TableRef) -> Result<Option<CatalogSnapshot>, ScanError>;

    /// Every primary-key column, optionally restricted to one schema.
    fn primary_keys(&self, schema: Option<&str>) -> Result<Vec<PrimaryKeyRow>, ScanError>;

    /// Every foreign-key column pair, optionally restricted to one schema.
    fn foreign_keys(&self, schema: Option<&str>) -> Result<Vec<ForeignKeyRow>, ScanError>;

    /// Every column of every table, optionally restricted to one schema.
    fn list_columns(&self, schema: Option<&str>) -> Result<Vec<CatalogColumn>, ScanError>;
}

/// Counts qualifying rows for one column.
pub trait MatchCounter {
    fn count_matches(&self, probe: &ColumnProbe<'_>) -> Result<u64, ScanError>;
}

/// Runs a value scan.
///
/// Fails with [`ScanError::MetadataNotFound`] when the table is missing and
/// with [`ScanError::UnknownColumn`] when an excluded column is not on it.
/// When neither candidate column exists no column is probed and the match list
/// is empty.
pub fn scan_table<B>(backend: &B, request: &ScanRequest) -> Result<ScanReport, ScanError>
where
    B: CatalogSource + MatchCounter + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _span = info_span!("scan_table", table = %request.table).entered();

    let snapshot =
        backend
            .load_table(&request.table)?
            .ok_or_else(|| ScanError::MetadataNotFound {
                table: request.table.to_string(),
            })?;

    for excluded in &request.excluded_columns {
        if !snapshot.has_column(excluded) {
            return Err(ScanError::UnknownColumn {
                table: snapshot.table.to_string(),
                column: excluded.clone(),
            });
        }
    }

    let resolved = resolve_filter(
        &snapshot,
        &request.candidate_a,
        &request.candidate_b,
        request.type_check,
    )?;
    let searchable = snapshot.searchable_columns(&request.excluded_columns);

    #[cfg(feature = "tracing")]
    info!(
        filter = %resolved.clause,
        columns = searchable.len(),
        "resolved row filter"
    );

    let mut matches = Vec::new();
    let mut probed = 0usize;

    if !resolved.clause.matches_nothing() {
        for column in searchable.iter().copied() {
            let probe = ColumnProbe {
                table: &snapshot.table,
                column,
                search: &request.search,
                match_mode: request.match_mode,
                filter: &resolved.clause,
                mismatched: &resolved.mismatched,
            };
            let count = backend.count_matches(&probe)?;
            probed += 1;

            #[cfg(feature = "tracing")]
            debug!(column = %column.name, count, "probed column");

            if count > 0 {
                matches.push(MatchResult::new(column.name.clone(), count));
            }
        }
    }

    matches.sort_by(|a, b| a.column_name.cmp(&b.column_name));

    Ok(ScanReport {
        diagnostics: ScanDiagnostics {
            target_table: snapshot.table.to_string(),
            candidate_a: CandidateStatus {
                column: request.candidate_a.column.clone(),
                present: resolved.a_present,
            },
            candidate_b: CandidateStatus {
                column: request.candidate_b.column.clone(),
                present: resolved.b_present,
            },
            row_filter: resolved.clause.to_string(),
            search_value: request.search.clone(),
            match_mode: request.match_mode,
            columns_considered: searchable.len(),
            columns_probed: probed,
            warnings: resolved.warnings,
        },
        matches,
    })
}

/// Lists primary-key columns ordered by table name, then key ordinal.
pub fn enumerate_primary_keys<S>(
    source: &S,
    schema: Option<&str>,
) -> Result<Vec<PrimaryKeyRow>, ScanError>
where
    S: CatalogSource + ?Sized,
{
    let mut rows = source.primary_keys(schema)?;
    sort_primary_keys(&mut rows);
    Ok(rows)
}

/// Lists foreign-key column pairs ordered by table, constraint, then key
/// ordinal.
pub fn enumerate_foreign_keys<S>(
    source: &S,
    schema: Option<&str>,
) -> Result<Vec<ForeignKeyRow>, ScanError>
where
    S: CatalogSource + ?Sized,
{
    let mut rows = source.foreign_keys(schema)?;
    sort_foreign_keys(&mut rows);
    Ok(rows)
}

pub fn sort_foreign_keys(rows: &mut [ForeignKeyRow]) {
    rows.sort_by(|a, b| {
        a.table_name
            .cmp(&b.table_name)
            .then_with(|| a.constraint_name.cmp(&b.constraint_name))
            .then(a.key_ordinal.cmp(&b.key_ordinal))
    });
}

pub fn sort_primary_keys(rows: &mut [PrimaryKeyRow]) {
    rows.sort_by(|a, b| {
        a.table_name
            .cmp(&b.table_name)
            .then(a.key_ordinal.cmp(&b.key_ordinal))
    });
}
