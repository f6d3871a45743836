//! Catalog-driven column value scanning.
//!
//! The crate holds the engine-independent half of `colscan`: the data model,
//! the candidate-column filter, dialect-aware query rendering, the scanner and
//! the key enumerators, join-path search over foreign keys, key diagrams in
//! WWW SQL Designer XML, and standalone SQL Server scripts. Database access
//! sits behind [`CatalogSource`] and [`MatchCounter`]; this crate performs no
//! I/O itself.

pub mod dialect;
pub mod error;
pub mod filter;
pub mod query;
pub mod relations;
pub mod scanner;
pub mod schema_xml;
pub mod script;
pub mod types;

pub use dialect::Dialect;
pub use error::ScanError;
pub use filter::{build_filter, resolve_filter, Candidate, FilterClause, Literal, TypeCheck};
pub use query::{count_query, BoundQuery, ColumnProbe};
pub use relations::{
    find_join_path, render_join_sql, JoinColumns, JoinPath, JoinPathReport, JoinStep,
    RelationGraph,
};
pub use scanner::{
    enumerate_foreign_keys, enumerate_primary_keys, scan_table, CatalogSource, MatchCounter,
};
pub use schema_xml::SchemaDiagram;
pub use script::{
    default_script_filename, render_foreign_key_script, render_primary_key_script,
    render_scan_script,
};
pub use types::{
    CandidateStatus, CatalogColumn, CatalogSnapshot, ColumnDescriptor, DeclaredType,
    ForeignKeyRow, MatchMode, MatchResult, PrimaryKeyRow, ScanDiagnostics, ScanReport,
    ScanRequest, TableRef,
};
