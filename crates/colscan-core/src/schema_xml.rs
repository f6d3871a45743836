//! Key diagrams in the WWW SQL Designer XML format.
//!
//! Only key columns appear: primary-key parts plus both ends of every
//! foreign key. Column types are not tracked, so every row is declared as
//! `INTEGER`. Tables are laid out left to right in rows, most connected first,
//! without overlapping.

use crate::types::{ForeignKeyRow, PrimaryKeyRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

const CHAR_WIDTH: f64 = 9.0;
const ROW_HEIGHT: u32 = 18;
const HEADER_HEIGHT: u32 = 28;
const MIN_WIDTH: f64 = 140.0;
const PADDING_WIDTH: f64 = 24.0;
const PADDING_HEIGHT: u32 = 12;

/// Space kept free around every table.
pub const MARGIN: u32 = 10;
/// Tables wrap to a new row past this width.
pub const CANVAS_WIDTH: u32 = 2400;

/// A foreign-key target of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramColumn {
    pub name: String,
    pub primary: bool,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramTable {
    pub name: String,
    pub columns: Vec<DiagramColumn>,
    /// Primary-key column names in key order.
    pub primary_key: Vec<String>,
    /// Distinct tables this one references plus distinct tables referencing it.
    pub connections: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DiagramTable {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            connections: 0,
            x: MARGIN,
            y: MARGIN,
            width: 0,
            height: 0,
        }
    }

    fn column_mut(&mut self, name: &str) -> &mut DiagramColumn {
        let index = match self.columns.iter().position(|column| column.name == name) {
            Some(index) => index,
            None => {
                self.columns.push(DiagramColumn {
                    name: name.to_string(),
                    primary: false,
                    relations: Vec::new(),
                });
                self.columns.len() - 1
            }
        };
        &mut self.columns[index]
    }

    fn measure(&mut self) {
        let longest = self
            .columns
            .iter()
            .map(|column| column.name.chars().count())
            .chain(std::iter::once(self.name.chars().count()))
            .max()
            .unwrap_or(0);
        let width = MIN_WIDTH.max(longest as f64 * CHAR_WIDTH + PADDING_WIDTH);
        self.width = width.round() as u32;
        self.height = HEADER_HEIGHT + self.columns.len() as u32 * ROW_HEIGHT + PADDING_HEIGHT;
    }

    /// True when the two boxes share any area.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Tables of a key diagram, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiagram {
    pub tables: Vec<DiagramTable>,
}

impl SchemaDiagram {
    /// Builds and lays out the diagram from key listings.
    pub fn from_keys(primary_keys: &[PrimaryKeyRow], foreign_keys: &[ForeignKeyRow]) -> Self {
        let mut tables: Vec<DiagramTable> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        let mut table_index = |tables: &mut Vec<DiagramTable>, name: &str| -> usize {
            *positions.entry(name.to_string()).or_insert_with(|| {
                tables.push(DiagramTable::new(name));
                tables.len() - 1
            })
        };

        let mut ordered_keys: Vec<&PrimaryKeyRow> = primary_keys.iter().collect();
        ordered_keys.sort_by_key(|row| row.key_ordinal);
        for row in ordered_keys {
            let index = table_index(&mut tables, &row.table_name);
            let table = &mut tables[index];
            table.column_mut(&row.column_name).primary = true;
            table.primary_key.push(row.column_name.clone());
        }

        for row in foreign_keys {
            let parent = table_index(&mut tables, &row.table_name);
            let referenced = table_index(&mut tables, &row.referenced_table);
            tables[parent]
                .column_mut(&row.column_name)
                .relations
                .push(Relation {
                    table: row.referenced_table.clone(),
                    column: row.referenced_column.clone(),
                });
            tables[referenced].column_mut(&row.referenced_column);
        }

        count_connections(&mut tables, foreign_keys);
        for table in &mut tables {
            table.measure();
        }
        // Stable: equally connected tables keep first-seen order.
        tables.sort_by(|a, b| b.connections.cmp(&a.connections));
        place_in_rows(&mut tables);

        Self { tables }
    }

    /// Renders the diagram as WWW SQL Designer XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n");
        out.push_str("<!-- SQL XML created by colscan -->\n");
        out.push_str("<!-- Generated from primary and foreign key listings -->\n");
        out.push_str("<sql>\n");
        out.push_str(DATATYPES);

        for table in &self.tables {
            out.push_str(&format!(
                "<table x=\"{}\" y=\"{}\" name=\"{}\">\n",
                table.x,
                table.y,
                escape(&table.name)
            ));
            for column in &table.columns {
                out.push_str(&format!(
                    "<row name=\"{}\" null=\"1\" autoincrement=\"{}\">\n",
                    escape(&column.name),
                    u8::from(column.primary)
                ));
                out.push_str("<datatype>INTEGER</datatype>\n");
                out.push_str("<default>NULL</default>");
                for relation in &column.relations {
                    out.push_str(&format!(
                        "<relation table=\"{}\" row=\"{}\" />\n",
                        escape(&relation.table),
                        escape(&relation.column)
                    ));
                }
                out.push_str("</row>\n");
            }
            if !table.primary_key.is_empty() {
                out.push_str("<key type=\"PRIMARY\" name=\"\">\n");
                for part in &table.primary_key {
                    out.push_str(&format!("<part>{}</part>\n", escape(part)));
                }
                out.push_str("</key>\n");
            }
            out.push_str("</table>\n");
        }

        out.push_str("</sql>\n");
        out
    }
}

fn count_connections(tables: &mut [DiagramTable], foreign_keys: &[ForeignKeyRow]) {
    let mut outgoing: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    let mut incoming: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for row in foreign_keys {
        outgoing
            .entry(row.table_name.as_str())
            .or_default()
            .insert(row.referenced_table.as_str());
        if row.referenced_table != row.table_name {
            incoming
                .entry(row.referenced_table.as_str())
                .or_default()
                .insert(row.table_name.as_str());
        }
    }
    for table in tables {
        let name = table.name.as_str();
        table.connections = outgoing.get(name).map_or(0, BTreeSet::len)
            + incoming.get(name).map_or(0, BTreeSet::len);
    }
}

fn place_in_rows(tables: &mut [DiagramTable]) {
    let gap = 2 * MARGIN;
    let mut x = MARGIN;
    let mut y = MARGIN;
    let mut row_height = 0;

    for table in tables {
        if x > MARGIN && x + table.width + MARGIN > CANVAS_WIDTH {
            x = MARGIN;
            y += row_height + gap;
            row_height = 0;
        }
        table.x = x;
        table.y = y;
        x += table.width + gap;
        row_height = row_height.max(table.height);
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

const DATATYPES: &str = r#"<datatypes db="mysql">
    <group label="Numeric" color="rgb(238,238,170)">
        <type label="Integer" length="0" sql="INTEGER" quote=""/>
        <type label="TINYINT" length="0" sql="TINYINT" quote=""/>
        <type label="SMALLINT" length="0" sql="SMALLINT" quote=""/>
        <type label="MEDIUMINT" length="0" sql="MEDIUMINT" quote=""/>
        <type label="INT" length="0" sql="INT" quote=""/>
        <type label="BIGINT" length="0" sql="BIGINT" quote=""/>
        <type label="Decimal" length="1" sql="DECIMAL" re="DEC" quote=""/>
        <type label="Single precision" length="0" sql="FLOAT" quote=""/>
        <type label="Double precision" length="0" sql="DOUBLE" re="DOUBLE" quote=""/>
    </group>
    <group label="Character" color="rgb(255,200,200)">
        <type label="Char" length="1" sql="CHAR" quote="'"/>
        <type label="Varchar" length="1" sql="VARCHAR" quote="'"/>
        <type label="Text" length="0" sql="MEDIUMTEXT" re="TEXT" quote="'"/>
        <type label="Binary" length="1" sql="BINARY" quote="'"/>
        <type label="Varbinary" length="1" sql="VARBINARY" quote="'"/>
        <type label="BLOB" length="0" sql="BLOB" re="BLOB" quote="'"/>
    </group>
    <group label="Date &amp; Time" color="rgb(200,255,200)">
        <type label="Date" length="0" sql="DATE" quote="'"/>
        <type label="Time" length="0" sql="TIME" quote="'"/>
        <type label="Datetime" length="0" sql="DATETIME" quote="'"/>
        <type label="Year" length="0" sql="YEAR" quote=""/>
        <type label="Timestamp" length="0" sql="TIMESTAMP" quote="'"/>
    </group>
    <group label="Miscellaneous" color="rgb(200,200,255)">
        <type label="ENUM" length="1" sql="ENUM" quote=""/>
        <type label="SET" length="1" sql="SET" quote=""/>
        <type label="Bit" length="0" sql="bit" quote=""/>
    </group>
</datatypes>
"#;
