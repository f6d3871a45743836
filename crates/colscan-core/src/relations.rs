//! Join paths over foreign-key relations.
//!
//! Every foreign-key constraint becomes an undirected edge between the two
//! tables it links. A breadth-first search over those edges yields the path
//! with the fewest joins, which is then rendered as an `INNER JOIN` chain.

use crate::dialect::Dialect;
use crate::error::ScanError;
use crate::types::{ForeignKeyRow, TableRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// One column pair of a join condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinColumns {
    /// Column of the table one step earlier on the path.
    pub previous_column: String,
    /// Column of the table being joined.
    pub column: String,
}

/// A table on a join path and how it attaches to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStep {
    pub table: String,
    /// Empty for the first table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<JoinColumns>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPath {
    pub steps: Vec<JoinStep>,
}

impl JoinPath {
    pub fn join_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

/// Result of a join-path lookup, as reported by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPathReport {
    pub from: String,
    pub to: String,
    pub path: Option<JoinPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

#[derive(Debug, Clone)]
struct Edge {
    to: String,
    on: Vec<JoinColumns>,
}

/// Tables linked by foreign keys, in both directions.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    edges: BTreeMap<String, Vec<Edge>>,
}

impl RelationGraph {
    /// Builds the graph from foreign-key rows.
    ///
    /// Rows sharing a table and constraint name form one composite edge whose
    /// column pairs follow the key ordinal. Rows without a constraint name
    /// each form their own edge.
    pub fn from_foreign_keys(rows: &[ForeignKeyRow]) -> Self {
        let mut groups: Vec<Vec<&ForeignKeyRow>> = Vec::new();
        let mut named: HashMap<(&str, &str, &str), usize> = HashMap::new();

        for row in rows {
            if row.constraint_name.is_empty() {
                groups.push(vec![row]);
                continue;
            }
            let key = (
                row.table_name.as_str(),
                row.constraint_name.as_str(),
                row.referenced_table.as_str(),
            );
            match named.get(&key) {
                Some(&index) => groups[index].push(row),
                None => {
                    named.insert(key, groups.len());
                    groups.push(vec![row]);
                }
            }
        }

        let mut graph = Self::default();
        for mut group in groups {
            group.sort_by_key(|row| row.key_ordinal);
            let table = &group[0].table_name;
            let referenced = &group[0].referenced_table;

            let forward = group
                .iter()
                .map(|row| JoinColumns {
                    previous_column: row.column_name.clone(),
                    column: row.referenced_column.clone(),
                })
                .collect();
            let backward = group
                .iter()
                .map(|row| JoinColumns {
                    previous_column: row.referenced_column.clone(),
                    column: row.column_name.clone(),
                })
                .collect();

            graph.add_edge(table, referenced, forward);
            graph.add_edge(referenced, table, backward);
        }
        graph
    }

    fn add_edge(&mut self, from: &str, to: &str, on: Vec<JoinColumns>) {
        self.edges.entry(from.to_string()).or_default().push(Edge {
            to: to.to_string(),
            on,
        });
    }

    pub fn contains(&self, table: &str) -> bool {
        self.edges.contains_key(table)
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// Path with the fewest joins from `from` to `to`, if they are connected.
    pub fn shortest_path<'a>(&'a self, from: &'a str, to: &str) -> Option<JoinPath> {
        let mut parent: HashMap<&'a str, Option<(&'a str, &'a [JoinColumns])>> = HashMap::new();
        let mut queue = VecDeque::new();
        parent.insert(from, None);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                return Some(reconstruct(&parent, current));
            }
            for edge in self.edges.get(current).into_iter().flatten() {
                if !parent.contains_key(edge.to.as_str()) {
                    parent.insert(edge.to.as_str(), Some((current, edge.on.as_slice())));
                    queue.push_back(edge.to.as_str());
                }
            }
        }
        None
    }
}

fn reconstruct(parent: &HashMap<&str, Option<(&str, &[JoinColumns])>>, end: &str) -> JoinPath {
    let mut steps = Vec::new();
    let mut current = end;
    while let Some(link) = parent.get(current) {
        match link {
            Some((previous, on)) => {
                steps.push(JoinStep {
                    table: current.to_string(),
                    on: on.to_vec(),
                });
                current = *previous;
            }
            None => {
                steps.push(JoinStep {
                    table: current.to_string(),
                    on: Vec::new(),
                });
                break;
            }
        }
    }
    steps.reverse();
    JoinPath { steps }
}

/// Shortest join path between two tables.
///
/// Fails with [`ScanError::NoRelations`] when either table has no foreign
/// key pointing to or from it. `Ok(None)` means both are related to
/// something, but not to each other.
pub fn find_join_path(
    rows: &[ForeignKeyRow],
    from: &str,
    to: &str,
) -> Result<Option<JoinPath>, ScanError> {
    let graph = RelationGraph::from_foreign_keys(rows);
    for table in [from, to] {
        if !graph.contains(table) {
            return Err(ScanError::NoRelations {
                table: table.to_string(),
            });
        }
    }
    Ok(graph.shortest_path(from, to))
}

/// Renders `SELECT *` over the tables of `path`, aliased `t0`, `t1`, ...
///
/// `database` adds a leading `USE` on engines that have one.
pub fn render_join_sql(
    dialect: Dialect,
    path: &JoinPath,
    schema: Option<&str>,
    database: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(database) = database {
        if matches!(dialect, Dialect::Mssql | Dialect::Mysql) {
            out.push_str(&format!("USE {};\n\n", dialect.quote_ident(database)));
        }
    }

    for (index, step) in path.steps.iter().enumerate() {
        let table = dialect.quote_table(&TableRef::new(
            schema.map(str::to_string),
            step.table.clone(),
        ));
        if index == 0 {
            out.push_str(&format!("SELECT *\nFROM {table} AS t0"));
            continue;
        }
        let conditions: Vec<String> = step
            .on
            .iter()
            .map(|pair| {
                format!(
                    "t{}.{} = t{index}.{}",
                    index - 1,
                    dialect.quote_ident(&pair.previous_column),
                    dialect.quote_ident(&pair.column)
                )
            })
            .collect();
        out.push_str(&format!(
            "\nINNER JOIN {table} AS t{index} ON {}",
            conditions.join(" AND ")
        ));
    }
    out.push_str(";\n");
    out
}
