//! Human-readable table output formatting.

use crate::index::IndexEntry;
use colscan_core::{
    CandidateStatus, ForeignKeyRow, JoinPathReport, MatchMode, PrimaryKeyRow, ScanReport,
};
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct MatchRow<'a> {
    #[tabled(rename = "Column")]
    column: &'a str,
    #[tabled(rename = "Matches")]
    matches: u64,
}

#[derive(Tabled)]
struct PrimaryKeyTableRow<'a> {
    #[tabled(rename = "Table")]
    table: &'a str,
    #[tabled(rename = "Constraint")]
    constraint: &'a str,
    #[tabled(rename = "Column")]
    column: &'a str,
    #[tabled(rename = "Ordinal")]
    ordinal: u32,
}

#[derive(Tabled)]
struct ForeignKeyTableRow<'a> {
    #[tabled(rename = "Table")]
    table: &'a str,
    #[tabled(rename = "Constraint")]
    constraint: &'a str,
    #[tabled(rename = "Column")]
    column: &'a str,
    #[tabled(rename = "References")]
    references: String,
    #[tabled(rename = "Ordinal")]
    ordinal: u32,
}

#[derive(Tabled)]
struct JoinStepRow<'a> {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Table")]
    table: &'a str,
    #[tabled(rename = "Joined On")]
    on: String,
}

#[derive(Tabled)]
struct ColumnRow<'a> {
    #[tabled(rename = "Source")]
    source: &'a str,
    #[tabled(rename = "Schema")]
    schema: &'a str,
    #[tabled(rename = "Table")]
    table: &'a str,
    #[tabled(rename = "Column")]
    column: &'a str,
}

/// Format a scan report: a diagnostics header, then the matching columns.
///
/// Warnings are left out when `quiet` is set.
pub fn format_scan_report(report: &ScanReport, quiet: bool, colored: bool) -> String {
    let diagnostics = &report.diagnostics;
    let mut out = String::new();

    push_header(&mut out, "Value Scan", colored);
    push_field(&mut out, "Table", &diagnostics.target_table);
    push_field(
        &mut out,
        "Search",
        &format!(
            "'{}' ({})",
            diagnostics.search_value,
            match_mode_label(diagnostics.match_mode)
        ),
    );
    push_field(
        &mut out,
        "Candidates",
        &format!(
            "{}, {}",
            candidate_label(&diagnostics.candidate_a),
            candidate_label(&diagnostics.candidate_b)
        ),
    );
    push_field(&mut out, "Filter", &diagnostics.row_filter);
    push_field(
        &mut out,
        "Columns",
        &format!(
            "{} considered, {} probed",
            diagnostics.columns_considered, diagnostics.columns_probed
        ),
    );
    out.push('\n');

    if report.matches.is_empty() {
        push_line(&mut out, "No matching columns.", colored, Tone::Dim);
    } else {
        let rows = report.matches.iter().map(|m| MatchRow {
            column: &m.column_name,
            matches: m.match_count,
        });
        push_grid(&mut out, Table::new(rows));
        let total = format!(
            "{} matching rows across {} columns",
            report.total_matches(),
            report.matches.len()
        );
        push_line(&mut out, &total, colored, Tone::Accent);
    }

    if !quiet && !diagnostics.warnings.is_empty() {
        out.push('\n');
        push_line(&mut out, "Warnings:", colored, Tone::Warning);
        for warning in &diagnostics.warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }

    out
}

/// Format primary-key rows as a grid.
pub fn format_primary_keys(rows: &[PrimaryKeyRow], colored: bool) -> String {
    let mut out = String::new();
    push_header(&mut out, "Primary Keys", colored);

    if rows.is_empty() {
        push_line(&mut out, "No primary keys found.", colored, Tone::Dim);
        return out;
    }

    let grid = Table::new(rows.iter().map(|row| PrimaryKeyTableRow {
        table: &row.table_name,
        constraint: &row.constraint_name,
        column: &row.column_name,
        ordinal: row.key_ordinal,
    }));
    push_grid(&mut out, grid);
    out
}

/// Format foreign-key rows as a grid.
pub fn format_foreign_keys(rows: &[ForeignKeyRow], colored: bool) -> String {
    let mut out = String::new();
    push_header(&mut out, "Foreign Keys", colored);

    if rows.is_empty() {
        push_line(&mut out, "No foreign keys found.", colored, Tone::Dim);
        return out;
    }

    let grid = Table::new(rows.iter().map(|row| ForeignKeyTableRow {
        table: &row.table_name,
        constraint: &row.constraint_name,
        column: &row.column_name,
        references: format!("{}.{}", row.referenced_table, row.referenced_column),
        ordinal: row.key_ordinal,
    }));
    push_grid(&mut out, grid);
    out
}

/// Format a join path: the tables in order, then the rendered query.
pub fn format_join_path(report: &JoinPathReport, colored: bool) -> String {
    let mut out = String::new();
    push_header(&mut out, "Join Path", colored);
    push_field(&mut out, "From", &report.from);
    push_field(&mut out, "To", &report.to);

    let Some(path) = &report.path else {
        out.push('\n');
        let message = format!("No join path between {} and {}.", report.from, report.to);
        push_line(&mut out, &message, colored, Tone::Dim);
        return out;
    };
    push_field(&mut out, "Joins", &path.join_count().to_string());
    out.push('\n');

    let grid = Table::new(path.steps.iter().enumerate().map(|(index, step)| JoinStepRow {
        step: index,
        table: &step.table,
        on: step
            .on
            .iter()
            .map(|pair| format!("{} = {}", pair.previous_column, pair.column))
            .collect::<Vec<_>>()
            .join(" AND "),
    }));
    push_grid(&mut out, grid);

    if let Some(sql) = &report.sql {
        out.push('\n');
        out.push_str(sql);
    }
    out
}

/// Format column index entries as a grid.
pub fn format_columns(entries: &[&IndexEntry], colored: bool) -> String {
    let mut out = String::new();
    push_header(&mut out, "Columns", colored);

    if entries.is_empty() {
        push_line(&mut out, "No matching columns.", colored, Tone::Dim);
        return out;
    }

    let grid = Table::new(entries.iter().map(|entry| ColumnRow {
        source: &entry.source_schema,
        schema: &entry.table_schema,
        table: &entry.table_name,
        column: &entry.column_name,
    }));
    push_grid(&mut out, grid);
    out
}

#[derive(Clone, Copy)]
enum Tone {
    Dim,
    Accent,
    Warning,
}

fn push_header(out: &mut String, title: &str, colored: bool) {
    let line = "═".repeat(50);
    if colored {
        out.push_str(&format!("{}\n{}\n", title.bold(), line.dimmed()));
    } else {
        out.push_str(&format!("{title}\n{line}\n"));
    }
}

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{:<12}{value}\n", format!("{label}:")));
}

fn push_line(out: &mut String, text: &str, colored: bool, tone: Tone) {
    if !colored {
        out.push_str(text);
    } else {
        match tone {
            Tone::Dim => out.push_str(&text.dimmed().to_string()),
            Tone::Accent => out.push_str(&text.cyan().to_string()),
            Tone::Warning => out.push_str(&text.yellow().to_string()),
        }
    }
    out.push('\n');
}

fn push_grid(out: &mut String, mut grid: Table) {
    grid.with(Style::rounded());
    out.push_str(&grid.to_string());
    out.push('\n');
}

fn match_mode_label(mode: MatchMode) -> &'static str {
    match mode {
        MatchMode::Contains => "contains",
        MatchMode::Exact => "exact",
    }
}

fn candidate_label(candidate: &CandidateStatus) -> String {
    let state = if candidate.present { "found" } else { "missing" };
    format!("{} {state}", candidate.column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colscan_core::{JoinColumns, JoinPath, JoinStep, MatchResult, ScanDiagnostics};

    fn report(matches: Vec<MatchResult>, warnings: Vec<String>) -> ScanReport {
        ScanReport {
            diagnostics: ScanDiagnostics {
                target_table: "dbo.ProcessSteps".to_string(),
                candidate_a: CandidateStatus {
                    column: "ProcessNumber".to_string(),
                    present: true,
                },
                candidate_b: CandidateStatus {
                    column: "ProcessID".to_string(),
                    present: false,
                },
                row_filter: "ProcessNumber = '10402'".to_string(),
                search_value: "S-FXM-1".to_string(),
                match_mode: MatchMode::Contains,
                columns_considered: 3,
                columns_probed: 3,
                warnings,
            },
            matches,
        }
    }

    #[test]
    fn test_scan_report_lists_matches() {
        let text = format_scan_report(
            &report(
                vec![MatchResult::new("Notes", 2), MatchResult::new("Operator", 1)],
                Vec::new(),
            ),
            false,
            false,
        );

        assert!(text.starts_with("Value Scan\n"));
        assert!(text.contains("Table:      dbo.ProcessSteps"));
        assert!(text.contains("ProcessNumber found, ProcessID missing"));
        assert!(text.contains("Filter:     ProcessNumber = '10402'"));
        assert!(text.contains("│ Notes    │ 2       │"));
        assert!(text.contains("3 matching rows across 2 columns"));
        assert!(!text.contains("Warnings:"));
    }

    #[test]
    fn test_empty_scan_report() {
        let text = format_scan_report(&report(Vec::new(), Vec::new()), false, false);
        assert!(text.contains("No matching columns."));
    }

    #[test]
    fn test_warnings_respect_quiet() {
        let warned = report(Vec::new(), vec!["ProcessID is int".to_string()]);

        assert!(format_scan_report(&warned, false, false).contains("  ProcessID is int"));
        assert!(!format_scan_report(&warned, true, false).contains("Warnings:"));
    }

    #[test]
    fn test_primary_key_grid() {
        let rows = vec![PrimaryKeyRow {
            table_name: "Orders".to_string(),
            constraint_name: "PK_Orders".to_string(),
            column_name: "Id".to_string(),
            key_ordinal: 1,
        }];

        let text = format_primary_keys(&rows, false);
        assert!(text.contains("Table"));
        assert!(text.contains("PK_Orders"));
        assert!(format_primary_keys(&[], false).contains("No primary keys found."));
    }

    #[test]
    fn test_foreign_key_grid() {
        let rows = vec![ForeignKeyRow {
            table_name: "StepTools".to_string(),
            constraint_name: "FK_StepTools_Tools".to_string(),
            column_name: "ToolId".to_string(),
            referenced_table: "Tools".to_string(),
            referenced_column: "ToolId".to_string(),
            key_ordinal: 1,
        }];

        let text = format_foreign_keys(&rows, false);
        assert!(text.starts_with("Foreign Keys\n"));
        assert!(text.contains("Tools.ToolId"));
        assert!(format_foreign_keys(&[], false).contains("No foreign keys found."));
    }

    #[test]
    fn test_join_path_lists_steps_and_sql() {
        let report = JoinPathReport {
            from: "Tools".to_string(),
            to: "ProcessSteps".to_string(),
            path: Some(JoinPath {
                steps: vec![
                    JoinStep {
                        table: "Tools".to_string(),
                        on: Vec::new(),
                    },
                    JoinStep {
                        table: "StepTools".to_string(),
                        on: vec![JoinColumns {
                            previous_column: "ToolId".to_string(),
                            column: "ToolId".to_string(),
                        }],
                    },
                ],
            }),
            sql: Some("SELECT *\nFROM Tools AS t0;\n".to_string()),
        };

        let text = format_join_path(&report, false);
        assert!(text.contains("Joins:      1"));
        assert!(text.contains("ToolId = ToolId"));
        assert!(text.ends_with("SELECT *\nFROM Tools AS t0;\n"));
    }

    #[test]
    fn test_missing_join_path() {
        let report = JoinPathReport {
            from: "Tools".to_string(),
            to: "Audit".to_string(),
            path: None,
            sql: None,
        };

        let text = format_join_path(&report, false);
        assert!(text.contains("No join path between Tools and Audit."));
    }
}
