//! Key listing files.
//!
//! Reads the CSV written by `primary-keys -f csv` and `foreign-keys -f csv`,
//! or saved from the SQL Server key scripts, whose headings are PascalCase.
//! Either delimiter is accepted, picked the same way as for column indexes.

use crate::index::detect_delimiter;
use colscan_core::{ForeignKeyRow, PrimaryKeyRow};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("failed to read key file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed key file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub fn read_primary_keys(path: &Path) -> Result<Vec<PrimaryKeyRow>, KeyFileError> {
    read_rows(path)
}

pub fn read_foreign_keys(path: &Path) -> Result<Vec<ForeignKeyRow>, KeyFileError> {
    read_rows(path)
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, KeyFileError> {
    let content = fs::read_to_string(path).map_err(|source| KeyFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rows(&content).map_err(|source| KeyFileError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_rows<T: DeserializeOwned>(content: &str) -> Result<Vec<T>, csv::Error> {
    let first_line = content.lines().next().unwrap_or_default();
    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(first_line))
        .trim(Trim::All)
        .from_reader(content.as_bytes());
    reader.deserialize().collect()
}
