//! Catalog snapshot types: tables, columns and declared types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (possibly schema-qualified) table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// Parses `table` or `schema.table`.
    ///
    /// Bracketed (`[dbo].[Steps]`) and double-quoted parts are unwrapped. Only
    /// the last dot outside quotes separates schema from table.
    pub fn parse(input: &str) -> Option<Self> {
        let parts = split_qualified(input.trim());
        match parts.as_slice() {
            [name] if !name.is_empty() => Some(Self::new(None, name.clone())),
            [schema, name] if !schema.is_empty() && !name.is_empty() => {
                Some(Self::new(Some(schema.clone()), name.clone()))
            }
            _ => None,
        }
    }

    /// Returns a copy with `schema` filled in when none was given.
    pub fn with_default_schema(&self, schema: Option<&str>) -> Self {
        match (&self.schema, schema) {
            (None, Some(default)) => Self::new(Some(default.to_string()), self.name.clone()),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

fn split_qualified(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut closing: Option<char> = None;

    for ch in input.chars() {
        match closing {
            Some(close) if ch == close => closing = None,
            Some(_) => current.push(ch),
            None => match ch {
                '[' => closing = Some(']'),
                '"' => closing = Some('"'),
                '`' => closing = Some('`'),
                '.' => parts.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            },
        }
    }
    parts.push(current);
    parts
}

/// Declared column type as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum DeclaredType {
    /// Fixed-width single-byte character (`char`, `character`).
    Char,
    /// Fixed-width wide character (`nchar`).
    NChar,
    /// Variable-width character (`varchar`, `character varying`).
    Varchar,
    /// Variable-width wide character (`nvarchar`).
    NVarchar,
    /// Unbounded character type (`text` and friends).
    Text,
    /// Anything else, keeping the catalog's spelling.
    Other(String),
}

impl DeclaredType {
    /// Classifies a catalog type name such as `nvarchar`, `VARCHAR(40)` or
    /// `character varying`.
    pub fn from_catalog_name(raw: &str) -> Self {
        let base = raw
            .split('(')
            .next()
            .unwrap_or(raw)
            .trim()
            .to_ascii_lowercase();

        match base.as_str() {
            "char" | "character" | "bpchar" => Self::Char,
            "nchar" | "national char" | "national character" => Self::NChar,
            "varchar" | "character varying" | "varchar2" => Self::Varchar,
            "nvarchar" | "national character varying" | "national char varying" => Self::NVarchar,
            "text" | "ntext" | "tinytext" | "mediumtext" | "longtext" | "clob" | "citext" => {
                Self::Text
            }
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// True for the types that take part in a value scan.
    pub fn is_character(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// True when the raw type name denotes a numeric type.
    pub fn is_numeric(&self) -> bool {
        let Self::Other(raw) = self else {
            return false;
        };
        let base = raw.split('(').next().unwrap_or(raw).trim().to_ascii_lowercase();
        matches!(
            base.as_str(),
            "int"
                | "integer"
                | "bigint"
                | "smallint"
                | "tinyint"
                | "mediumint"
                | "int2"
                | "int4"
                | "int8"
                | "numeric"
                | "decimal"
                | "real"
                | "float"
                | "float4"
                | "float8"
                | "double"
                | "double precision"
                | "money"
                | "smallmoney"
                | "bit"
        )
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char => f.write_str("char"),
            Self::NChar => f.write_str("nchar"),
            Self::Varchar => f.write_str("varchar"),
            Self::NVarchar => f.write_str("nvarchar"),
            Self::Text => f.write_str("text"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// One column of the target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
    /// 1-based position in the table definition.
    pub ordinal: u32,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            declared_type,
            ordinal,
        }
    }
}

/// Read-only snapshot of one table's columns, taken once per run.
///
/// This is the allow-list for every identifier that ends up in query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub table: TableRef,
    pub columns: Vec<ColumnDescriptor>,
}

impl CatalogSnapshot {
    pub fn new(table: TableRef, mut columns: Vec<ColumnDescriptor>) -> Self {
        columns.sort_by_key(|column| column.ordinal);
        Self { table, columns }
    }

    /// Exact, case-sensitive lookup.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Character-like columns minus `excluded`, in ordinal order.
    pub fn searchable_columns<'a>(&'a self, excluded: &[String]) -> Vec<&'a ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|column| column.declared_type.is_character())
            .filter(|column| !excluded.iter().any(|name| name == &column.name))
            .collect()
    }
}

/// A column from a database-wide catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogColumn {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
}

/// One column of a declared primary key.
///
/// The aliases accept the column headings of the SQL Server listing script,
/// so its saved output reads back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyRow {
    #[serde(alias = "TableName")]
    pub table_name: String,
    #[serde(default, alias = "PrimaryKeyName")]
    pub constraint_name: String,
    #[serde(alias = "ColumnName")]
    pub column_name: String,
    /// 1-based position inside a (possibly composite) key.
    #[serde(alias = "KeyOrdinal", alias = "KeyOrder")]
    pub key_ordinal: u32,
}

/// One column pair of a declared foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRow {
    /// The referencing table.
    #[serde(alias = "ParentTable")]
    pub table_name: String,
    #[serde(default, alias = "ForeignKeyName")]
    pub constraint_name: String,
    #[serde(alias = "ParentColumn")]
    pub column_name: String,
    #[serde(alias = "ReferencedTable")]
    pub referenced_table: String,
    #[serde(alias = "ReferencedColumn")]
    pub referenced_column: String,
    /// 1-based position inside a (possibly composite) key.
    #[serde(default = "first_ordinal", alias = "KeyOrdinal")]
    pub key_ordinal: u32,
}

fn first_ordinal() -> u32 {
    1
}
