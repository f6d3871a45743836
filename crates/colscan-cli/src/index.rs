//! Column index files: a flat CSV of `(source, schema, table, column)` rows
//! used to look up which tables carry a column before scanning one.

use colscan_core::CatalogColumn;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const INDEX_HEADER: [&str; 4] = ["SOURCE_SCHEMA", "TABLE_SCHEMA", "TABLE_NAME", "COLUMN_NAME"];

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed index: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of a column index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub source_schema: String,
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
}

impl IndexEntry {
    pub fn from_catalog(source: &str, column: &CatalogColumn) -> Self {
        Self {
            source_schema: source.to_string(),
            table_schema: column.schema.clone(),
            table_name: column.table.clone(),
            column_name: column.column.clone(),
        }
    }

    fn sort_key(&self) -> (String, String, String, String) {
        (
            self.source_schema.to_lowercase(),
            self.table_schema.to_lowercase(),
            self.table_name.to_lowercase(),
            self.column_name.to_lowercase(),
        )
    }
}

/// Reads an index file.
///
/// The delimiter is picked from the first line (see [`detect_delimiter`]).
/// A leading header row is skipped, as are rows with fewer than four fields
/// or a blank one among the first four. Entries come back sorted
/// case-insensitively.
pub fn read_index(path: &Path) -> Result<Vec<IndexEntry>, IndexError> {
    let content = fs::read_to_string(path).map_err(|source| IndexError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_index(&content)
}

pub fn parse_index(content: &str) -> Result<Vec<IndexEntry>, IndexError> {
    let first_line = content.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(first_line);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut entries = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if line == 0 && is_header(&record) {
            continue;
        }
        if record.len() < INDEX_HEADER.len()
            || record.iter().take(INDEX_HEADER.len()).any(str::is_empty)
        {
            continue;
        }
        entries.push(IndexEntry {
            source_schema: record[0].to_string(),
            table_schema: record[1].to_string(),
            table_name: record[2].to_string(),
            column_name: record[3].to_string(),
        });
    }

    entries.sort_by_cached_key(IndexEntry::sort_key);
    Ok(entries)
}

/// Tab when the line has only tabs, comma when it has only commas, else
/// whichever occurs more often, ties going to tab.
pub fn detect_delimiter(first_line: &str) -> u8 {
    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();
    match (tabs, commas) {
        (t, 0) if t > 0 => b'\t',
        (0, c) if c > 0 => b',',
        (t, c) if t >= c => b'\t',
        _ => b',',
    }
}

/// A header names all four index columns, in any order and case.
fn is_header(record: &csv::StringRecord) -> bool {
    let cells: Vec<String> = record.iter().map(|cell| cell.trim().to_uppercase()).collect();
    INDEX_HEADER
        .iter()
        .all(|name| cells.iter().any(|cell| cell == name))
}

/// Entries whose column name contains `fragment`, ignoring case.
pub fn find_columns<'a>(entries: &'a [IndexEntry], fragment: &str) -> Vec<&'a IndexEntry> {
    let needle = fragment.to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.column_name.to_lowercase().contains(&needle))
        .collect()
}

/// Writes `entries` as a comma-separated index with a header row.
pub fn write_index<W: Write>(out: W, entries: &[IndexEntry]) -> Result<(), IndexError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(INDEX_HEADER)?;
    for entry in entries {
        writer.write_record([
            &entry.source_schema,
            &entry.table_schema,
            &entry.table_name,
            &entry.column_name,
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(source: &str, schema: &str, table: &str, column: &str) -> IndexEntry {
        IndexEntry {
            source_schema: source.to_string(),
            table_schema: schema.to_string(),
            table_name: table.to_string(),
            column_name: column.to_string(),
        }
    }

    #[test]
    fn test_comma_index_with_header() {
        let entries = parse_index(
            "SOURCE_SCHEMA,TABLE_SCHEMA,TABLE_NAME,COLUMN_NAME\n\
             plant,dbo,ProcessSteps,ProcessNumber\n\
             plant,dbo,Orders,Id\n",
        )
        .unwrap();

        assert_eq!(
            entries,
            vec![
                entry("plant", "dbo", "Orders", "Id"),
                entry("plant", "dbo", "ProcessSteps", "ProcessNumber"),
            ]
        );
    }

    #[test]
    fn test_tab_index_without_header() {
        let entries = parse_index("plant\tdbo\tsteps\tNotes\nplant\tdbo\tSteps\tId\n").unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].column_name, "Id");
        assert_eq!(entries[1].column_name, "Notes");
    }

    #[test]
    fn test_short_and_blank_rows_are_skipped() {
        let entries = parse_index(
            "plant,dbo,Steps,Notes\n\
             plant,dbo\n\
             ,,,\n\
             \n\
             plant , dbo , Steps , Remarks \n",
        )
        .unwrap();

        assert_eq!(
            entries,
            vec![
                entry("plant", "dbo", "Steps", "Notes"),
                entry("plant", "dbo", "Steps", "Remarks"),
            ]
        );
    }

    #[test]
    fn test_row_with_one_blank_key_field_is_skipped() {
        let entries = parse_index(
            "plant,dbo,Steps,Notes\n\
             plant,,Steps,Remarks\n\
             plant,dbo,,Operator\n\
             plant,dbo,Steps,\n\
             plant,dbo,Steps,Id,\n",
        )
        .unwrap();

        let columns: Vec<_> = entries.iter().map(|e| e.column_name.as_str()).collect();
        assert_eq!(columns, vec!["Id", "Notes"]);
    }

    #[test]
    fn test_header_columns_in_any_order() {
        let entries = parse_index(
            "table_name, column_name, Source_Schema, TABLE_SCHEMA\n\
             plant,dbo,Steps,Notes\n",
        )
        .unwrap();

        assert_eq!(entries, vec![entry("plant", "dbo", "Steps", "Notes")]);
    }

    #[test]
    fn test_first_row_with_partial_header_names_is_data() {
        let entries = parse_index("SOURCE_SCHEMA,dbo,Steps,Notes\n").unwrap();

        assert_eq!(entries, vec![entry("SOURCE_SCHEMA", "dbo", "Steps", "Notes")]);
    }

    #[test]
    fn test_detect_delimiter_by_count() {
        assert_eq!(detect_delimiter("a\tb\tc\td"), b'\t');
        assert_eq!(detect_delimiter("a,b,c,d"), b',');
        assert_eq!(detect_delimiter("a\tb\tc\tnotes, free text"), b'\t');
        assert_eq!(detect_delimiter("a,b,c,d\tx"), b',');
        assert_eq!(detect_delimiter("a\tb,c"), b'\t');
        assert_eq!(detect_delimiter("single"), b'\t');
    }

    #[test]
    fn test_comma_file_with_stray_tab_in_first_line() {
        let entries = parse_index("plant,dbo,Steps,Line\tNo\nplant,dbo,Steps,Notes\n").unwrap();

        let columns: Vec<_> = entries.iter().map(|e| e.column_name.as_str()).collect();
        assert_eq!(columns, vec!["Line\tNo", "Notes"]);
    }

    #[test]
    fn test_find_columns_ignores_case() {
        let entries = vec![
            entry("plant", "dbo", "Steps", "ProcessNumber"),
            entry("plant", "dbo", "Steps", "Notes"),
            entry("plant", "dbo", "Runs", "PROCESSID"),
        ];

        let found: Vec<_> = find_columns(&entries, "process")
            .into_iter()
            .map(|e| e.column_name.as_str())
            .collect();
        assert_eq!(found, vec!["ProcessNumber", "PROCESSID"]);

        assert_eq!(find_columns(&entries, "").len(), 3);
        assert!(find_columns(&entries, "missing").is_empty());
    }

    #[test]
    fn test_written_index_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("columns.csv");
        let entries = vec![
            entry("plant", "public", "steps", "notes, free text"),
            entry("plant", "public", "steps", "id"),
        ];

        let mut buffer = Vec::new();
        write_index(&mut buffer, &entries).unwrap();
        fs::write(&path, &buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("SOURCE_SCHEMA,TABLE_SCHEMA,TABLE_NAME,COLUMN_NAME\n"));

        let read = read_index(&path).unwrap();
        assert_eq!(read[0].column_name, "id");
        assert_eq!(read[1].column_name, "notes, free text");
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = read_index(Path::new("/nonexistent/columns.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/columns.csv"));
    }

    #[test]
    fn test_from_catalog() {
        let column = CatalogColumn {
            schema: "public".to_string(),
            table: "steps".to_string(),
            column: "notes".to_string(),
            data_type: "text".to_string(),
        };
        assert_eq!(
            IndexEntry::from_catalog("plant", &column),
            entry("plant", "public", "steps", "notes")
        );
    }
}
