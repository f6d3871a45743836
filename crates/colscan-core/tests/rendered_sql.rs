//! Rendered statements must parse in every dialect they are rendered for.

use colscan_core::{
    build_filter, count_query, find_join_path, render_join_sql, Candidate, ColumnDescriptor,
    ColumnProbe, DeclaredType, Dialect, ForeignKeyRow, MatchMode, TableRef,
};
use rstest::rstest;
use sqlparser::dialect::{
    Dialect as ParserDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

fn parser_dialect(dialect: Dialect) -> Box<dyn ParserDialect> {
    match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::Mysql => Box::new(MySqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Mssql => Box::new(MsSqlDialect {}),
    }
}

#[rstest]
fn count_query_parses(
    #[values(Dialect::Postgres, Dialect::Mysql, Dialect::Sqlite, Dialect::Mssql)] dialect: Dialect,
    #[values(MatchMode::Contains, MatchMode::Exact)] mode: MatchMode,
    #[values((true, true), (true, false), (false, false))] presence: (bool, bool),
    #[values(false, true)] mixed_types: bool,
) {
    let table = TableRef::new(Some("sales".to_string()), "Process Steps");
    let column = ColumnDescriptor::new("Notes", DeclaredType::Varchar, 1);
    let filter = build_filter(
        presence.0,
        presence.1,
        Candidate::text("ProcessNumber", "10402"),
        Candidate::integer("ProcessID", 93),
    );

    let mismatched = if mixed_types {
        vec!["ProcessID".to_string()]
    } else {
        Vec::new()
    };

    let query = count_query(
        dialect,
        &ColumnProbe {
            table: &table,
            column: &column,
            search: "S-FXM-1",
            match_mode: mode,
            filter: &filter,
            mismatched: &mismatched,
        },
    );

    let statements = Parser::parse_sql(parser_dialect(dialect).as_ref(), &query.sql)
        .unwrap_or_else(|err| panic!("{dialect}: {err}\n{}", query.sql));
    assert_eq!(statements.len(), 1);
    assert_eq!(query.params.len(), 1 + filter.candidates().len());
}

fn foreign_key(table: &str, constraint: &str, column: &str, referenced: &str, ordinal: u32) -> ForeignKeyRow {
    ForeignKeyRow {
        table_name: table.to_string(),
        constraint_name: constraint.to_string(),
        column_name: column.to_string(),
        referenced_table: referenced.to_string(),
        referenced_column: column.to_string(),
        key_ordinal: ordinal,
    }
}

#[rstest]
fn join_sql_parses(
    #[values(Dialect::Postgres, Dialect::Mysql, Dialect::Sqlite, Dialect::Mssql)] dialect: Dialect,
    #[values(None, Some("sales"))] schema: Option<&str>,
) {
    let rows = vec![
        foreign_key("Step Tools", "FK_Tools", "ToolId", "Tools", 1),
        foreign_key("Step Tools", "FK_Steps", "StepId", "ProcessSteps", 1),
        foreign_key("Shipments", "FK_Lines", "StepId", "Step Tools", 1),
        foreign_key("Shipments", "FK_Lines", "ToolId", "Step Tools", 2),
    ];
    let path = find_join_path(&rows, "Tools", "Shipments")
        .expect("related tables")
        .expect("connected tables");

    let sql = render_join_sql(dialect, &path, schema, Some("Plant"));

    let statements = Parser::parse_sql(parser_dialect(dialect).as_ref(), &sql)
        .unwrap_or_else(|err| panic!("{dialect}: {err}\n{sql}"));
    let expected = if matches!(dialect, Dialect::Mssql | Dialect::Mysql) { 2 } else { 1 };
    assert_eq!(statements.len(), expected);
    assert!(sql.contains(" AND "), "composite key joins on both columns:\n{sql}");
}
