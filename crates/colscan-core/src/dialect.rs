//! Per-engine identifier quoting, placeholders and predicates.

use crate::types::TableRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database engines the scan can be rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Mysql,
    Sqlite,
    Mssql,
}

impl Dialect {
    /// Quotes an identifier, doubling the closing quote character.
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Self::Postgres | Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::Mysql => format!("`{}`", ident.replace('`', "``")),
            Self::Mssql => format!("[{}]", ident.replace(']', "]]")),
        }
    }

    pub fn quote_table(self, table: &TableRef) -> String {
        match &table.schema {
            Some(schema) => format!("{}.{}", self.quote_ident(schema), self.quote_ident(&table.name)),
            None => self.quote_ident(&table.name),
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${index}"),
            Self::Mysql | Self::Sqlite => "?".to_string(),
            Self::Mssql => format!("@p{index}"),
        }
    }

    /// Equality between a column and a parameter of a different type.
    ///
    /// PostgreSQL has no implicit conversion between text and numbers, so
    /// both sides are cast to text there. The other engines convert on their
    /// own.
    pub fn mixed_type_equality(self, column: &str, param: &str) -> String {
        match self {
            Self::Postgres => format!("CAST({column} AS TEXT) = CAST({param} AS TEXT)"),
            Self::Mysql | Self::Sqlite | Self::Mssql => format!("{column} = {param}"),
        }
    }

    /// Literal substring test: no LIKE wildcards are involved.
    pub fn contains_predicate(self, column: &str, param: &str) -> String {
        match self {
            Self::Postgres => format!("strpos({column}, {param}) > 0"),
            Self::Mysql => format!("INSTR({column}, {param}) > 0"),
            Self::Sqlite => format!("instr({column}, {param}) > 0"),
            Self::Mssql => format!("CHARINDEX({param}, {column}) > 0"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Postgres => "PostgreSQL",
            Self::Mysql => "MySQL",
            Self::Sqlite => "SQLite",
            Self::Mssql => "SQL Server",
        };
        f.write_str(name)
    }
}

/// Single-quoted string literal with embedded quotes doubled.
pub fn quote_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// SQL Server Unicode literal (`N'...'`).
pub fn quote_nstring_literal(value: &str) -> String {
    format!("N{}", quote_string_literal(value))
}
