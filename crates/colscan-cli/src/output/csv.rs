//! CSV output formatting.
//!
//! Rows are serialized through serde, so headers carry the same camelCase
//! field names as the JSON output.

use colscan_core::{JoinPathReport, ScanReport};
use csv::WriterBuilder;
use serde::Serialize;

/// Format a list of rows as CSV with a header row.
pub fn format_csv<T: Serialize>(rows: &[T]) -> csv::Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Format the matches of a scan. An empty result still gets its header.
pub fn format_scan_csv(report: &ScanReport) -> csv::Result<String> {
    if report.matches.is_empty() {
        return Ok("columnName,matchCount\n".to_string());
    }
    format_csv(&report.matches)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinStepRecord<'a> {
    step: usize,
    table: &'a str,
    previous_column: &'a str,
    column: &'a str,
}

/// Format a join path with one row per column pair; the first table gets a
/// row with empty columns. No path gives the header alone.
pub fn format_join_path_csv(report: &JoinPathReport) -> csv::Result<String> {
    let Some(path) = &report.path else {
        return Ok("step,table,previousColumn,column\n".to_string());
    };
    let mut records = Vec::new();
    for (index, step) in path.steps.iter().enumerate() {
        if step.on.is_empty() {
            records.push(JoinStepRecord {
                step: index,
                table: &step.table,
                previous_column: "",
                column: "",
            });
        }
        for pair in &step.on {
            records.push(JoinStepRecord {
                step: index,
                table: &step.table,
                previous_column: &pair.previous_column,
                column: &pair.column,
            });
        }
    }
    format_csv(&records)
}
