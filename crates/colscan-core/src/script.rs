//! Standalone T-SQL scripts for SQL Server.
//!
//! There is no SQL Server driver in the live backend, so for that engine the
//! scan is emitted as a script to run by hand. The script repeats the whole
//! pipeline server-side: column detection through `COL_LENGTH`, the four-way
//! filter choice, one parameterised `sp_executesql` count per character column,
//! and a diagnostics row. Working state lives in table variables. The key
//! listing scripts produce the column headings that the CLI reads back as key
//! files.

use crate::dialect::{quote_nstring_literal, Dialect};
use crate::filter::{Candidate, Literal};
use crate::types::{MatchMode, ScanRequest};

const DEFAULT_SCHEMA: &str = "dbo";

/// Renders the value-scan script for `request`.
///
/// `database`, when given, is selected with `USE` before anything else runs.
/// As in the live scan, a missing table or an excluded column that the table
/// does not have stops the script with an error before any column is counted.
pub fn render_scan_script(request: &ScanRequest, database: Option<&str>) -> String {
    let schema = request.table.schema.as_deref().unwrap_or(DEFAULT_SCHEMA);
    let table = &request.table.name;
    let a = &request.candidate_a;
    let b = &request.candidate_b;

    let mut out = String::new();

    out.push_str(&header_comment(request, database, schema));
    out.push_str("SET NOCOUNT ON;\n\n");
    if let Some(database) = database {
        out.push_str(&format!("USE {};\n\n", Dialect::Mssql.quote_ident(database)));
    }

    out.push_str(&format!(
        "DECLARE @SearchValue NVARCHAR(4000) = {};\n",
        quote_nstring_literal(&request.search)
    ));
    out.push_str(&format!(
        "DECLARE @FullTable NVARCHAR(520) = QUOTENAME({}) + N'.' + QUOTENAME({});\n\n",
        quote_nstring_literal(schema),
        quote_nstring_literal(table)
    ));

    out.push_str(
        "IF OBJECT_ID(@FullTable, N'U') IS NULL\n\
         BEGIN\n\
         \x20   RAISERROR(N'Table %s was not found.', 16, 1, @FullTable);\n\
         \x20   RETURN;\n\
         END;\n\n",
    );

    out.push_str(&format!(
        "DECLARE @HasCandidateA BIT = CASE WHEN COL_LENGTH(@FullTable, {}) IS NULL THEN 0 ELSE 1 END;\n",
        quote_nstring_literal(&a.column)
    ));
    out.push_str(&format!(
        "DECLARE @HasCandidateB BIT = CASE WHEN COL_LENGTH(@FullTable, {}) IS NULL THEN 0 ELSE 1 END;\n\n",
        quote_nstring_literal(&b.column)
    ));

    for excluded in &request.excluded_columns {
        let name = quote_nstring_literal(excluded);
        out.push_str(&format!(
            "IF COL_LENGTH(@FullTable, {name}) IS NULL\n\
             BEGIN\n\
             \x20   RAISERROR(N'Column %s is not present on %s.', 16, 1, {name}, @FullTable);\n\
             \x20   RETURN;\n\
             END;\n\n"
        ));
    }

    let equality_a = candidate_equality(a, "@a");
    let equality_b = candidate_equality(b, "@b");
    out.push_str("DECLARE @RowFilter NVARCHAR(MAX) =\n    CASE\n");
    out.push_str(&format!(
        "        WHEN @HasCandidateA = 1 AND @HasCandidateB = 1 THEN {}\n",
        quote_nstring_literal(&format!("({equality_a} OR {equality_b})"))
    ));
    out.push_str(&format!(
        "        WHEN @HasCandidateA = 1 THEN {}\n",
        quote_nstring_literal(&equality_a)
    ));
    out.push_str(&format!(
        "        WHEN @HasCandidateB = 1 THEN {}\n",
        quote_nstring_literal(&equality_b)
    ));
    out.push_str("        ELSE N'1 = 0'\n    END;\n\n");

    out.push_str(
        "DECLARE @Cols TABLE (ColumnName SYSNAME NOT NULL, ColumnId INT NOT NULL);\n\
         DECLARE @Hits TABLE (ColumnName SYSNAME NOT NULL, MatchCount BIGINT NOT NULL);\n\n",
    );

    out.push_str(
        "INSERT INTO @Cols (ColumnName, ColumnId)\n\
         SELECT c.name, c.column_id\n\
         FROM   sys.columns AS c\n\
         JOIN   sys.types   AS ty ON ty.user_type_id = c.user_type_id\n\
         WHERE  c.object_id = OBJECT_ID(@FullTable)\n\
         \x20 AND  ty.name IN (N'char', N'nchar', N'varchar', N'nvarchar')",
    );
    if !request.excluded_columns.is_empty() {
        let excluded: Vec<_> = request
            .excluded_columns
            .iter()
            .map(|column| quote_nstring_literal(column))
            .collect();
        out.push_str(&format!("\n  AND  c.name NOT IN ({})", excluded.join(", ")));
    }
    out.push_str(";\n\n");

    let match_sql = match request.match_mode {
        MatchMode::Contains => "N' WHERE CHARINDEX(@p, ' + QUOTENAME(@Col) + N') > 0'",
        MatchMode::Exact => "N' WHERE ' + QUOTENAME(@Col) + N' = @p'",
    };
    let params = format!(
        "N'@p NVARCHAR(4000), @a {}, @b {}, @cnt BIGINT OUTPUT'",
        parameter_type(&a.literal),
        parameter_type(&b.literal)
    );

    out.push_str(
        "DECLARE @Col SYSNAME;\n\
         DECLARE @Count BIGINT;\n\
         DECLARE @sql NVARCHAR(MAX);\n\n\
         IF @HasCandidateA = 1 OR @HasCandidateB = 1\n\
         BEGIN\n\
         \x20   DECLARE col_cur CURSOR LOCAL FAST_FORWARD FOR\n\
         \x20       SELECT ColumnName FROM @Cols ORDER BY ColumnId;\n\n\
         \x20   OPEN col_cur;\n\
         \x20   FETCH NEXT FROM col_cur INTO @Col;\n\n\
         \x20   WHILE @@FETCH_STATUS = 0\n\
         \x20   BEGIN\n",
    );
    out.push_str(&format!(
        "        SET @sql = N'SELECT @cnt = COUNT_BIG(*) FROM ' + @FullTable\n\
         \x20                + {match_sql}\n\
         \x20                + N' AND ' + @RowFilter + N';';\n\n"
    ));
    out.push_str(&format!(
        "        EXEC sp_executesql @sql,\n\
         \x20           {params},\n\
         \x20           @p = @SearchValue, @a = {}, @b = {}, @cnt = @Count OUTPUT;\n\n",
        literal_value(&a.literal),
        literal_value(&b.literal)
    ));
    out.push_str(
        "        IF @Count > 0\n\
         \x20           INSERT INTO @Hits (ColumnName, MatchCount) VALUES (@Col, @Count);\n\n\
         \x20       FETCH NEXT FROM col_cur INTO @Col;\n\
         \x20   END;\n\n\
         \x20   CLOSE col_cur;\n\
         \x20   DEALLOCATE col_cur;\n\
         END;\n\n",
    );

    out.push_str(
        "SELECT ColumnName, MatchCount\n\
         FROM   @Hits\n\
         ORDER BY ColumnName;\n\n\
         SELECT\n\
         \x20   TargetTable    = @FullTable,\n\
         \x20   HasCandidateA  = @HasCandidateA,\n\
         \x20   HasCandidateB  = @HasCandidateB,\n\
         \x20   RowFilter      = @RowFilter,\n\
         \x20   SearchValue    = @SearchValue,\n\
         \x20   ColumnsScanned = (SELECT COUNT(*) FROM @Cols);\n",
    );

    out
}

/// Renders the primary-key listing script.
pub fn render_primary_key_script(database: Option<&str>) -> String {
    let mut out = String::from("SET NOCOUNT ON;\n\n");
    if let Some(database) = database {
        out.push_str(&format!("USE {};\n\n", Dialect::Mssql.quote_ident(database)));
    }
    out.push_str(
        "SELECT\n\
         \x20   TableName      = t.name,\n\
         \x20   PrimaryKeyName = kc.name,\n\
         \x20   ColumnName     = c.name,\n\
         \x20   KeyOrdinal     = ic.key_ordinal\n\
         FROM   sys.key_constraints AS kc\n\
         JOIN   sys.tables          AS t  ON t.object_id = kc.parent_object_id\n\
         JOIN   sys.index_columns   AS ic ON ic.object_id = kc.parent_object_id\n\
         \x20                            AND ic.index_id = kc.unique_index_id\n\
         JOIN   sys.columns         AS c  ON c.object_id = ic.object_id\n\
         \x20                            AND c.column_id = ic.column_id\n\
         WHERE  kc.type = 'PK'\n\
         ORDER BY t.name, ic.key_ordinal;\n",
    );
    out
}

/// Renders the foreign-key listing script, one row per column pair.
pub fn render_foreign_key_script(database: Option<&str>) -> String {
    let mut out = String::from("SET NOCOUNT ON;\n\n");
    if let Some(database) = database {
        out.push_str(&format!("USE {};\n\n", Dialect::Mssql.quote_ident(database)));
    }
    out.push_str(
        "SELECT\n\
         \x20   ForeignKeyName   = fk.name,\n\
         \x20   ParentTable      = tp.name,\n\
         \x20   ParentColumn     = cp.name,\n\
         \x20   ReferencedTable  = tr.name,\n\
         \x20   ReferencedColumn = cr.name,\n\
         \x20   KeyOrdinal       = fkc.constraint_column_id\n\
         FROM   sys.foreign_keys        AS fk\n\
         JOIN   sys.foreign_key_columns AS fkc ON fkc.constraint_object_id = fk.object_id\n\
         JOIN   sys.tables              AS tp  ON tp.object_id = fkc.parent_object_id\n\
         JOIN   sys.columns             AS cp  ON cp.object_id = fkc.parent_object_id\n\
         \x20                                 AND cp.column_id = fkc.parent_column_id\n\
         JOIN   sys.tables              AS tr  ON tr.object_id = fkc.referenced_object_id\n\
         JOIN   sys.columns             AS cr  ON cr.object_id = fkc.referenced_object_id\n\
         \x20                                 AND cr.column_id = fkc.referenced_column_id\n\
         ORDER BY tp.name, fk.name, fkc.constraint_column_id;\n",
    );
    out
}

/// `find-value-in-<database>-<schema>-<table>.sql` with unsafe characters
/// replaced by underscores.
pub fn default_script_filename(database: Option<&str>, schema: &str, table: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(database) = database {
        parts.push(sanitize_filename_component(database));
    }
    parts.push(sanitize_filename_component(schema));
    parts.push(sanitize_filename_component(table));
    format!("find-value-in-{}.sql", parts.join("-"))
}

fn sanitize_filename_component(component: &str) -> String {
    let replaced: String = component
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { '_' })
        .collect();
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "value".to_string()
    } else {
        trimmed.to_string()
    }
}

fn header_comment(request: &ScanRequest, database: Option<&str>, schema: &str) -> String {
    let target = match database {
        Some(database) => format!("{database}.{schema}.{}", request.table.name),
        None => format!("{schema}.{}", request.table.name),
    };
    let excluded = if request.excluded_columns.is_empty() {
        "none".to_string()
    } else {
        request.excluded_columns.join(", ")
    };
    let mode = match request.match_mode {
        MatchMode::Contains => "contains",
        MatchMode::Exact => "exact",
    };

    let body = format!(
        "Value scan generated by colscan\n\
         Target table : {target}\n\
         Search value : {}\n\
         Candidate A  : {}\n\
         Candidate B  : {}\n\
         Match mode   : {mode}\n\
         Excluded     : {excluded}",
        request.search, request.candidate_a, request.candidate_b
    );
    // T-SQL block comments nest, so both delimiters are defused.
    let body = body.replace("/*", "/ *").replace("*/", "* /");
    format!("/*\n{body}\n*/\n")
}

fn candidate_equality(candidate: &Candidate, param: &str) -> String {
    format!("{} = {param}", Dialect::Mssql.quote_ident(&candidate.column))
}

fn parameter_type(literal: &Literal) -> &'static str {
    match literal {
        Literal::Text(_) => "NVARCHAR(4000)",
        Literal::Integer(_) => "BIGINT",
    }
}

fn literal_value(literal: &Literal) -> String {
    match literal {
        Literal::Text(text) => quote_nstring_literal(text),
        Literal::Integer(value) => value.to_string(),
    }
}
