//! In-memory catalog and table data for scanner tests.

#![allow(dead_code)]

use colscan_core::{
    CatalogColumn, CatalogSnapshot, CatalogSource, ColumnDescriptor, ColumnProbe, DeclaredType,
    FilterClause, ForeignKeyRow, Literal, MatchCounter, PrimaryKeyRow, ScanError, TableRef,
};
use std::cell::Cell;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Null,
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub fn int(value: i64) -> Value {
    Value::Integer(value)
}

#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<HashMap<String, Value>>,
}

impl MemoryTable {
    pub fn new(name: &str) -> Self {
        Self {
            table: TableRef::new(None, name),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, name: &str, declared_type: &str) -> Self {
        let ordinal = self.columns.len() as u32 + 1;
        self.columns.push(ColumnDescriptor::new(
            name,
            DeclaredType::from_catalog_name(declared_type),
            ordinal,
        ));
        self
    }

    pub fn row(mut self, values: &[(&str, Value)]) -> Self {
        self.rows.push(
            values
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        );
        self
    }

    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(self.table.clone(), self.columns.clone())
    }
}

/// A database made of [`MemoryTable`]s that counts how often it is probed.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    pub tables: Vec<MemoryTable>,
    pub primary_keys: Vec<PrimaryKeyRow>,
    pub foreign_keys: Vec<ForeignKeyRow>,
    pub unreachable: bool,
    pub probes: Cell<usize>,
}

impl MemoryDatabase {
    pub fn with_table(table: MemoryTable) -> Self {
        Self {
            tables: vec![table],
            ..Default::default()
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.get()
    }

    fn find(&self, table: &TableRef) -> Option<&MemoryTable> {
        self.tables.iter().find(|candidate| candidate.table.name == table.name)
    }
}

impl CatalogSource for MemoryDatabase {
    fn load_table(&self, table: &TableRef) -> Result<Option<CatalogSnapshot>, ScanError> {
        if self.unreachable {
            return Err(ScanError::connectivity("connection refused"));
        }
        Ok(self.find(table).map(MemoryTable::snapshot))
    }

    fn primary_keys(&self, _schema: Option<&str>) -> Result<Vec<PrimaryKeyRow>, ScanError> {
        if self.unreachable {
            return Err(ScanError::connectivity("connection refused"));
        }
        Ok(self.primary_keys.clone())
    }

    fn foreign_keys(&self, _schema: Option<&str>) -> Result<Vec<ForeignKeyRow>, ScanError> {
        if self.unreachable {
            return Err(ScanError::connectivity("connection refused"));
        }
        Ok(self.foreign_keys.clone())
    }

    fn list_columns(&self, _schema: Option<&str>) -> Result<Vec<CatalogColumn>, ScanError> {
        Ok(self
            .tables
            .iter()
            .flat_map(|table| {
                table.columns.iter().map(|column| CatalogColumn {
                    schema: "main".to_string(),
                    table: table.table.name.clone(),
                    column: column.name.clone(),
                    data_type: column.declared_type.to_string(),
                })
            })
            .collect())
    }
}

impl MatchCounter for MemoryDatabase {
    fn count_matches(&self, probe: &ColumnProbe<'_>) -> Result<u64, ScanError> {
        self.probes.set(self.probes.get() + 1);
        let table = self
            .find(probe.table)
            .ok_or_else(|| ScanError::query("no such table"))?;

        let count = table
            .rows
            .iter()
            .filter(|row| match row.get(&probe.column.name) {
                Some(Value::Text(value)) => probe.match_mode.matches(value, probe.search),
                _ => false,
            })
            .filter(|row| filter_holds(probe.filter, row))
            .count();
        Ok(count as u64)
    }
}

fn filter_holds(filter: &FilterClause, row: &HashMap<String, Value>) -> bool {
    filter
        .candidates()
        .iter()
        .any(|candidate| equals(row.get(&candidate.column), &candidate.literal))
}

fn equals(value: Option<&Value>, literal: &Literal) -> bool {
    match (value, literal) {
        (Some(Value::Text(value)), Literal::Text(expected)) => value == expected,
        (Some(Value::Integer(value)), Literal::Integer(expected)) => value == expected,
        (Some(Value::Text(value)), Literal::Integer(expected)) => {
            value.trim().parse::<i64>().ok() == Some(*expected)
        }
        (Some(Value::Integer(value)), Literal::Text(expected)) => {
            expected.trim().parse::<i64>().ok() == Some(*value)
        }
        _ => false,
    }
}

/// `ProcessSteps` with `ProcessNumber` but without `ProcessID`.
pub fn process_steps() -> MemoryTable {
    MemoryTable::new("ProcessSteps")
        .column("StepId", "int")
        .column("ProcessNumber", "varchar")
        .column("Notes", "nvarchar")
        .column("Operator", "char")
        .column("Remarks", "text")
        .row(&[
            ("StepId", int(1)),
            ("ProcessNumber", text("10402")),
            ("Notes", text("rework after S-FXM-1 failure")),
            ("Operator", text("S-FXM-1")),
            ("Remarks", Value::Null),
        ])
        .row(&[
            ("StepId", int(2)),
            ("ProcessNumber", text("10402")),
            ("Notes", text("S-FXM-1 recalibrated")),
            ("Operator", text("JD")),
            ("Remarks", text("none")),
        ])
        .row(&[
            ("StepId", int(3)),
            ("ProcessNumber", text("10403")),
            ("Notes", text("S-FXM-1 in other process")),
            ("Operator", text("S-FXM-1")),
            ("Remarks", text("S-FXM-1")),
        ])
        .row(&[
            ("StepId", int(4)),
            ("ProcessNumber", text("10402")),
            ("Notes", text("s-fxm-1 lower case")),
            ("Operator", text("AB")),
            ("Remarks", text("ok")),
        ])
}
