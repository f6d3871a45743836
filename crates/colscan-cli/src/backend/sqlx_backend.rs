//! SQLx-based backend for live catalog reads and match counting.
//!
//! Supports PostgreSQL, MySQL, and SQLite databases. The scanner is
//! synchronous, so the backend owns a tokio runtime and blocks on each query.

use colscan_core::{
    count_query, CatalogColumn, CatalogSnapshot, CatalogSource, ColumnDescriptor, ColumnProbe,
    DeclaredType, ForeignKeyRow, Literal, MatchCounter, PrimaryKeyRow, ScanError, TableRef,
};
use sqlx::any::AnyRow;
use sqlx::{Any, AnyPool, Row};
use tokio::runtime::Runtime;

use super::{BackendError, DatabaseType};

/// Splits SQLx failures into lost connections and failing statements.
fn classify(err: sqlx::Error) -> ScanError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ScanError::connectivity(err),
        other => ScanError::query(other),
    }
}

/// A scanner backend that queries system catalogs and counts matches over
/// one SQLx pool.
pub struct SqlxBackend {
    runtime: Runtime,
    pool: AnyPool,
    db_type: DatabaseType,
}

impl SqlxBackend {
    /// Connect to the database at the given URL.
    ///
    /// # Errors
    /// Returns an error if the URL scheme is not supported or the connection
    /// fails.
    pub fn connect(url: &str) -> Result<Self, BackendError> {
        let db_type = DatabaseType::for_url(url)?;
        sqlx::any::install_default_drivers();

        let runtime = Runtime::new()?;
        let pool = runtime
            .block_on(AnyPool::connect(url))
            .map_err(|err| BackendError::Connect(err.to_string()))?;

        Ok(Self {
            runtime,
            pool,
            db_type,
        })
    }

    pub fn database_type(&self) -> DatabaseType {
        self.db_type
    }

    fn fetch_all(&self, sql: &str, binds: &[&str]) -> Result<Vec<AnyRow>, ScanError> {
        self.runtime.block_on(async {
            let mut query = sqlx::query::<Any>(sql);
            for value in binds {
                query = query.bind(*value);
            }
            query.fetch_all(&self.pool).await.map_err(classify)
        })
    }

    async fn fetch_count(&self, sql: &str, params: &[Literal]) -> Result<i64, ScanError> {
        let mut query = sqlx::query::<Any>(sql);
        for param in params {
            query = match param {
                Literal::Text(text) => query.bind(text.as_str()),
                Literal::Integer(value) => query.bind(*value),
            };
        }
        let row = query.fetch_one(&self.pool).await.map_err(classify)?;
        row.try_get::<i64, _>("match_count").map_err(classify)
    }
}

/// Catalog queries per database.
///
/// Every selected column is cast to a plain text or bigint type; the `Any`
/// driver cannot decode the information_schema domain types (PostgreSQL) or
/// binary-collated names (MySQL).
mod catalog_sql {
    pub const POSTGRES_TABLE: &str = r#"
        SELECT
            column_name::text AS column_name,
            data_type::text AS data_type,
            ordinal_position::bigint AS ordinal_position
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
    "#;

    pub const MYSQL_TABLE: &str = r#"
        SELECT
            CAST(COLUMN_NAME AS CHAR) AS column_name,
            CAST(DATA_TYPE AS CHAR) AS data_type,
            CAST(ORDINAL_POSITION AS SIGNED) AS ordinal_position
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    "#;

    pub const MYSQL_TABLE_CURRENT_DB: &str = r#"
        SELECT
            CAST(COLUMN_NAME AS CHAR) AS column_name,
            CAST(DATA_TYPE AS CHAR) AS data_type,
            CAST(ORDINAL_POSITION AS SIGNED) AS ordinal_position
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    "#;

    pub const SQLITE_TABLE: &str = r#"
        SELECT name AS column_name, type AS data_type, cid + 1 AS ordinal_position
        FROM pragma_table_info(?)
        ORDER BY cid
    "#;

    pub const SQLITE_TABLE_IN_SCHEMA: &str = r#"
        SELECT name AS column_name, type AS data_type, cid + 1 AS ordinal_position
        FROM pragma_table_info(?, ?)
        ORDER BY cid
    "#;

    pub const POSTGRES_PRIMARY_KEYS: &str = r#"
        SELECT
            tc.table_name::text AS table_name,
            tc.constraint_name::text AS constraint_name,
            kcu.column_name::text AS column_name,
            kcu.ordinal_position::bigint AS key_ordinal
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
            AND tc.table_name = kcu.table_name
        WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = $1
        ORDER BY tc.table_name, kcu.ordinal_position
    "#;

    pub const MYSQL_PRIMARY_KEYS: &str = r#"
        SELECT
            CAST(tc.TABLE_NAME AS CHAR) AS table_name,
            CAST(tc.CONSTRAINT_NAME AS CHAR) AS constraint_name,
            CAST(kcu.COLUMN_NAME AS CHAR) AS column_name,
            CAST(kcu.ORDINAL_POSITION AS SIGNED) AS key_ordinal
        FROM information_schema.TABLE_CONSTRAINTS tc
        JOIN information_schema.KEY_COLUMN_USAGE kcu
            ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
            AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
            AND tc.TABLE_NAME = kcu.TABLE_NAME
        WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' AND tc.TABLE_SCHEMA = ?
        ORDER BY tc.TABLE_NAME, kcu.ORDINAL_POSITION
    "#;

    pub const MYSQL_PRIMARY_KEYS_CURRENT_DB: &str = r#"
        SELECT
            CAST(tc.TABLE_NAME AS CHAR) AS table_name,
            CAST(tc.CONSTRAINT_NAME AS CHAR) AS constraint_name,
            CAST(kcu.COLUMN_NAME AS CHAR) AS column_name,
            CAST(kcu.ORDINAL_POSITION AS SIGNED) AS key_ordinal
        FROM information_schema.TABLE_CONSTRAINTS tc
        JOIN information_schema.KEY_COLUMN_USAGE kcu
            ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
            AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
            AND tc.TABLE_NAME = kcu.TABLE_NAME
        WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' AND tc.TABLE_SCHEMA = DATABASE()
        ORDER BY tc.TABLE_NAME, kcu.ORDINAL_POSITION
    "#;

    // SQLite has no named primary-key constraints; the name is synthesised
    // from the table name by the caller.
    pub const SQLITE_PRIMARY_KEYS: &str = r#"
        SELECT m.name AS table_name, p.name AS column_name, p.pk AS key_ordinal
        FROM sqlite_master AS m, pragma_table_info(m.name) AS p
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%' AND p.pk > 0
        ORDER BY m.name, p.pk
    "#;

    // Composite keys pair up through position_in_unique_constraint.
    pub const POSTGRES_FOREIGN_KEYS: &str = r#"
        SELECT
            kcu.table_name::text AS table_name,
            kcu.constraint_name::text AS constraint_name,
            kcu.column_name::text AS column_name,
            rk.table_name::text AS referenced_table,
            rk.column_name::text AS referenced_column,
            kcu.ordinal_position::bigint AS key_ordinal
        FROM information_schema.referential_constraints rc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_schema = rc.constraint_schema
            AND kcu.constraint_name = rc.constraint_name
        JOIN information_schema.key_column_usage rk
            ON rk.constraint_schema = rc.unique_constraint_schema
            AND rk.constraint_name = rc.unique_constraint_name
            AND rk.ordinal_position = kcu.position_in_unique_constraint
        WHERE kcu.table_schema = $1
        ORDER BY kcu.table_name, kcu.constraint_name, kcu.ordinal_position
    "#;

    pub const MYSQL_FOREIGN_KEYS: &str = r#"
        SELECT
            CAST(TABLE_NAME AS CHAR) AS table_name,
            CAST(CONSTRAINT_NAME AS CHAR) AS constraint_name,
            CAST(COLUMN_NAME AS CHAR) AS column_name,
            CAST(REFERENCED_TABLE_NAME AS CHAR) AS referenced_table,
            CAST(REFERENCED_COLUMN_NAME AS CHAR) AS referenced_column,
            CAST(ORDINAL_POSITION AS SIGNED) AS key_ordinal
        FROM information_schema.KEY_COLUMN_USAGE
        WHERE REFERENCED_TABLE_NAME IS NOT NULL AND TABLE_SCHEMA = ?
        ORDER BY TABLE_NAME, CONSTRAINT_NAME, ORDINAL_POSITION
    "#;

    pub const MYSQL_FOREIGN_KEYS_CURRENT_DB: &str = r#"
        SELECT
            CAST(TABLE_NAME AS CHAR) AS table_name,
            CAST(CONSTRAINT_NAME AS CHAR) AS constraint_name,
            CAST(COLUMN_NAME AS CHAR) AS column_name,
            CAST(REFERENCED_TABLE_NAME AS CHAR) AS referenced_table,
            CAST(REFERENCED_COLUMN_NAME AS CHAR) AS referenced_column,
            CAST(ORDINAL_POSITION AS SIGNED) AS key_ordinal
        FROM information_schema.KEY_COLUMN_USAGE
        WHERE REFERENCED_TABLE_NAME IS NOT NULL AND TABLE_SCHEMA = DATABASE()
        ORDER BY TABLE_NAME, CONSTRAINT_NAME, ORDINAL_POSITION
    "#;

    // `to` is NULL when the reference names the parent's primary key
    // implicitly; the caller fills it in from the primary-key listing.
    pub const SQLITE_FOREIGN_KEYS: &str = r#"
        SELECT
            m.name AS table_name,
            f.id AS constraint_id,
            f."from" AS column_name,
            f."table" AS referenced_table,
            f."to" AS referenced_column,
            f.seq + 1 AS key_ordinal
        FROM sqlite_master AS m, pragma_foreign_key_list(m.name) AS f
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
        ORDER BY m.name, f.id, f.seq
    "#;

    pub const POSTGRES_COLUMNS: &str = r#"
        SELECT
            table_schema::text AS table_schema,
            table_name::text AS table_name,
            column_name::text AS column_name,
            data_type::text AS data_type
        FROM information_schema.columns
        WHERE table_schema = $1
        ORDER BY table_schema, table_name, ordinal_position
    "#;

    pub const MYSQL_COLUMNS: &str = r#"
        SELECT
            CAST(TABLE_SCHEMA AS CHAR) AS table_schema,
            CAST(TABLE_NAME AS CHAR) AS table_name,
            CAST(COLUMN_NAME AS CHAR) AS column_name,
            CAST(DATA_TYPE AS CHAR) AS data_type
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = ?
        ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION
    "#;

    pub const MYSQL_COLUMNS_CURRENT_DB: &str = r#"
        SELECT
            CAST(TABLE_SCHEMA AS CHAR) AS table_schema,
            CAST(TABLE_NAME AS CHAR) AS table_name,
            CAST(COLUMN_NAME AS CHAR) AS column_name,
            CAST(DATA_TYPE AS CHAR) AS data_type
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE()
        ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION
    "#;

    pub const SQLITE_COLUMNS: &str = r#"
        SELECT 'main' AS table_schema, m.name AS table_name, p.name AS column_name, p.type AS data_type
        FROM sqlite_master AS m, pragma_table_info(m.name) AS p
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
        ORDER BY m.name, p.cid
    "#;
}

const POSTGRES_DEFAULT_SCHEMA: &str = "public";

impl CatalogSource for SqlxBackend {
    fn load_table(&self, table: &TableRef) -> Result<Option<CatalogSnapshot>, ScanError> {
        let schema = table.schema.as_deref();
        let name = table.name.as_str();

        let rows = match (self.db_type, schema) {
            (DatabaseType::Postgres, schema) => self.fetch_all(
                catalog_sql::POSTGRES_TABLE,
                &[schema.unwrap_or(POSTGRES_DEFAULT_SCHEMA), name],
            )?,
            (DatabaseType::Mysql, Some(schema)) => {
                self.fetch_all(catalog_sql::MYSQL_TABLE, &[schema, name])?
            }
            (DatabaseType::Mysql, None) => {
                self.fetch_all(catalog_sql::MYSQL_TABLE_CURRENT_DB, &[name])?
            }
            (DatabaseType::Sqlite, Some(schema)) => {
                self.fetch_all(catalog_sql::SQLITE_TABLE_IN_SCHEMA, &[name, schema])?
            }
            (DatabaseType::Sqlite, None) => self.fetch_all(catalog_sql::SQLITE_TABLE, &[name])?,
        };

        if rows.is_empty() {
            return Ok(None);
        }

        let columns = rows
            .iter()
            .map(|row| {
                let name: String = row.try_get("column_name").map_err(classify)?;
                let data_type: String = row.try_get("data_type").map_err(classify)?;
                let ordinal: i64 = row.try_get("ordinal_position").map_err(classify)?;
                Ok(ColumnDescriptor::new(
                    name,
                    DeclaredType::from_catalog_name(&data_type),
                    u32::try_from(ordinal).map_err(ScanError::query)?,
                ))
            })
            .collect::<Result<Vec<_>, ScanError>>()?;

        Ok(Some(CatalogSnapshot::new(table.clone(), columns)))
    }

    fn primary_keys(&self, schema: Option<&str>) -> Result<Vec<PrimaryKeyRow>, ScanError> {
        let rows = match (self.db_type, schema) {
            (DatabaseType::Postgres, schema) => self.fetch_all(
                catalog_sql::POSTGRES_PRIMARY_KEYS,
                &[schema.unwrap_or(POSTGRES_DEFAULT_SCHEMA)],
            )?,
            (DatabaseType::Mysql, Some(schema)) => {
                self.fetch_all(catalog_sql::MYSQL_PRIMARY_KEYS, &[schema])?
            }
            (DatabaseType::Mysql, None) => {
                self.fetch_all(catalog_sql::MYSQL_PRIMARY_KEYS_CURRENT_DB, &[])?
            }
            (DatabaseType::Sqlite, _) => self.fetch_all(catalog_sql::SQLITE_PRIMARY_KEYS, &[])?,
        };

        rows.iter()
            .map(|row| {
                let table_name: String = row.try_get("table_name").map_err(classify)?;
                let constraint_name = match self.db_type {
                    DatabaseType::Sqlite => format!("pk_{table_name}"),
                    _ => row
                        .try_get::<String, _>("constraint_name")
                        .map_err(classify)?,
                };
                let key_ordinal: i64 = row.try_get("key_ordinal").map_err(classify)?;
                Ok(PrimaryKeyRow {
                    table_name,
                    constraint_name,
                    column_name: row.try_get("column_name").map_err(classify)?,
                    key_ordinal: u32::try_from(key_ordinal).map_err(ScanError::query)?,
                })
            })
            .collect()
    }

    fn foreign_keys(&self, schema: Option<&str>) -> Result<Vec<ForeignKeyRow>, ScanError> {
        let rows = match (self.db_type, schema) {
            (DatabaseType::Postgres, schema) => self.fetch_all(
                catalog_sql::POSTGRES_FOREIGN_KEYS,
                &[schema.unwrap_or(POSTGRES_DEFAULT_SCHEMA)],
            )?,
            (DatabaseType::Mysql, Some(schema)) => {
                self.fetch_all(catalog_sql::MYSQL_FOREIGN_KEYS, &[schema])?
            }
            (DatabaseType::Mysql, None) => {
                self.fetch_all(catalog_sql::MYSQL_FOREIGN_KEYS_CURRENT_DB, &[])?
            }
            (DatabaseType::Sqlite, _) => self.fetch_all(catalog_sql::SQLITE_FOREIGN_KEYS, &[])?,
        };

        let mut keys = rows
            .iter()
            .map(|row| {
                let table_name: String = row.try_get("table_name").map_err(classify)?;
                let constraint_name = match self.db_type {
                    DatabaseType::Sqlite => {
                        let id: i64 = row.try_get("constraint_id").map_err(classify)?;
                        format!("fk_{table_name}_{id}")
                    }
                    _ => row
                        .try_get::<String, _>("constraint_name")
                        .map_err(classify)?,
                };
                let key_ordinal: i64 = row.try_get("key_ordinal").map_err(classify)?;
                Ok(ForeignKeyRow {
                    table_name,
                    constraint_name,
                    column_name: row.try_get("column_name").map_err(classify)?,
                    referenced_table: row.try_get("referenced_table").map_err(classify)?,
                    referenced_column: row
                        .try_get::<Option<String>, _>("referenced_column")
                        .map_err(classify)?
                        .unwrap_or_default(),
                    key_ordinal: u32::try_from(key_ordinal).map_err(ScanError::query)?,
                })
            })
            .collect::<Result<Vec<_>, ScanError>>()?;

        if keys.iter().any(|key| key.referenced_column.is_empty()) {
            let primary_keys = self.primary_keys(schema)?;
            fill_implicit_references(&mut keys, &primary_keys);
        }
        Ok(keys)
    }

    fn list_columns(&self, schema: Option<&str>) -> Result<Vec<CatalogColumn>, ScanError> {
        let rows = match (self.db_type, schema) {
            (DatabaseType::Postgres, schema) => self.fetch_all(
                catalog_sql::POSTGRES_COLUMNS,
                &[schema.unwrap_or(POSTGRES_DEFAULT_SCHEMA)],
            )?,
            (DatabaseType::Mysql, Some(schema)) => {
                self.fetch_all(catalog_sql::MYSQL_COLUMNS, &[schema])?
            }
            (DatabaseType::Mysql, None) => {
                self.fetch_all(catalog_sql::MYSQL_COLUMNS_CURRENT_DB, &[])?
            }
            (DatabaseType::Sqlite, _) => self.fetch_all(catalog_sql::SQLITE_COLUMNS, &[])?,
        };

        rows.iter()
            .map(|row| {
                Ok(CatalogColumn {
                    schema: row.try_get("table_schema").map_err(classify)?,
                    table: row.try_get("table_name").map_err(classify)?,
                    column: row.try_get("column_name").map_err(classify)?,
                    data_type: row.try_get("data_type").map_err(classify)?,
                })
            })
            .collect()
    }
}

/// Points references that name no column at the referenced table's primary
/// key part with the same ordinal.
fn fill_implicit_references(keys: &mut [ForeignKeyRow], primary_keys: &[PrimaryKeyRow]) {
    for key in keys.iter_mut().filter(|key| key.referenced_column.is_empty()) {
        if let Some(pk) = primary_keys.iter().find(|pk| {
            pk.table_name == key.referenced_table && pk.key_ordinal == key.key_ordinal
        }) {
            key.referenced_column = pk.column_name.clone();
        }
    }
}

impl MatchCounter for SqlxBackend {
    fn count_matches(&self, probe: &ColumnProbe<'_>) -> Result<u64, ScanError> {
        let bound = count_query(self.db_type.dialect(), probe);
        let count = self
            .runtime
            .block_on(self.fetch_count(&bound.sql, &bound.params))?;
        u64::try_from(count).map_err(ScanError::query)
    }
}
