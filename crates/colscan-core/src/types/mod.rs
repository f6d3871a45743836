//! Data model shared by the scanner, the renderers and the CLI.

mod catalog;
mod report;

pub use catalog::{
    CatalogColumn, CatalogSnapshot, ColumnDescriptor, DeclaredType, ForeignKeyRow, PrimaryKeyRow,
    TableRef,
};
pub use report::{
    CandidateStatus, MatchMode, MatchResult, ScanDiagnostics, ScanReport, ScanRequest,
};
