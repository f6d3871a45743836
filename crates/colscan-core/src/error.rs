//! Error types for catalog scanning.
//!
//! Every variant is terminal for the run: there is no retry and no partial
//! result. A table that has neither candidate column is *not* an error; it
//! produces an empty match list instead.

use thiserror::Error;

/// Error raised while loading catalog metadata or probing columns.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The database could not be reached or the pool failed.
    #[error("Connection error: {0}")]
    Connectivity(String),

    /// The target table (or its schema) is not in the catalog.
    #[error("Table not found in catalog: {table}")]
    MetadataNotFound { table: String },

    /// An identifier was requested that the catalog snapshot does not contain.
    #[error("Column '{column}' is not present on {table}")]
    UnknownColumn { table: String, column: String },

    /// A candidate literal cannot be compared with the column's declared type.
    #[error("Literal {literal} is not comparable with column '{column}' of type {declared_type}")]
    IncompatibleLiteral {
        column: String,
        declared_type: String,
        literal: String,
    },

    /// A join path was requested for a table that no foreign key touches.
    #[error("Table {table} takes part in no foreign-key relation")]
    NoRelations { table: String },

    /// Any other failing statement.
    #[error("Query failed: {0}")]
    Query(String),
}

impl ScanError {
    /// Wraps a driver error as a connectivity failure.
    pub fn connectivity(err: impl std::fmt::Display) -> Self {
        Self::Connectivity(err.to_string())
    }

    /// Wraps a driver error as a query failure.
    pub fn query(err: impl std::fmt::Display) -> Self {
        Self::Query(err.to_string())
    }
}
