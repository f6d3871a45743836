//! CLI argument parsing using clap.

use clap::{Parser, Subcommand, ValueEnum};
use colscan_core::{Candidate, Dialect, MatchMode, TypeCheck};
use std::path::PathBuf;

/// colscan - find which text columns of a table hold a value
#[derive(Parser, Debug)]
#[command(name = "colscan")]
#[command(about = "Find which text columns of a table hold a value", long_about = None)]
#[command(version, author)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum, global = true)]
    pub format: OutputFormat,

    /// Output file (defaults to stdout; for `script`, a directory selects the default file name)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long, global = true)]
    pub compact: bool,

    /// Suppress warnings on stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count matching rows per text column of a live table
    Scan(ScanArgs),

    /// List primary-key columns of a live database
    PrimaryKeys(ConnectionArgs),

    /// List foreign-key columns of a live database
    ForeignKeys(ConnectionArgs),

    /// Export key tables and relations as WWW SQL Designer XML
    SchemaXml(SchemaXmlArgs),

    /// Find the shortest foreign-key join path between two tables
    JoinPath(JoinPathArgs),

    /// Render a standalone T-SQL script for SQL Server
    #[command(subcommand)]
    Script(ScriptCommand),

    /// Search column names by fragment in an index file or a live catalog
    FindColumn(FindColumnArgs),

    /// Export a live catalog as a column index (always CSV)
    Index(IndexArgs),
}

/// Live database connection
#[derive(clap::Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Database connection URL (postgres://..., mysql://..., sqlite://...)
    #[arg(long, value_name = "URL", env = "COLSCAN_DATABASE_URL")]
    pub url: String,

    /// Schema to read (defaults to `public` on PostgreSQL and the current database on MySQL)
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,
}

/// What to scan and how rows are filtered
#[derive(clap::Args, Debug, Clone)]
pub struct ScanTarget {
    /// Target table, optionally schema-qualified
    #[arg(long, default_value = "ProcessSteps")]
    pub table: String,

    /// Text to look for
    #[arg(long, default_value = "S-FXM-1")]
    pub search: String,

    /// First candidate filter column (COL='text' or COL=123)
    #[arg(long, value_name = "COL=LITERAL", default_value = "ProcessNumber='10402'")]
    pub candidate_a: Candidate,

    /// Second candidate filter column (COL='text' or COL=123)
    #[arg(long, value_name = "COL=LITERAL", default_value = "ProcessID=93")]
    pub candidate_b: Candidate,

    /// Column to leave out of the scan (can be repeated)
    #[arg(long = "exclude", value_name = "COLUMN")]
    pub exclude: Vec<String>,

    /// How a column value must relate to the search text
    #[arg(long = "match", value_enum, default_value = "contains")]
    pub match_mode: MatchArg,

    /// Treatment of literals whose type differs from the candidate column
    #[arg(long, value_enum, default_value = "permissive")]
    pub type_check: TypeCheckArg,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub target: ScanTarget,
}

#[derive(Subcommand, Debug)]
pub enum ScriptCommand {
    /// Value scan script
    Scan(ScriptScanArgs),

    /// Primary-key listing script
    PrimaryKeys(ScriptDatabaseArgs),

    /// Foreign-key listing script
    ForeignKeys(ScriptDatabaseArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScriptScanArgs {
    /// Database to switch to with USE
    #[arg(long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Schema of the target table (defaults to dbo)
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    #[command(flatten)]
    pub target: ScanTarget,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScriptDatabaseArgs {
    /// Database to switch to with USE
    #[arg(long, value_name = "DATABASE")]
    pub database: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FindColumnArgs {
    /// Case-insensitive fragment of a column name
    #[arg(value_name = "FRAGMENT")]
    pub fragment: String,

    /// Column index CSV (SOURCE_SCHEMA, TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME)
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Live database to read the catalog from when no index is given
    #[arg(long, value_name = "URL", env = "COLSCAN_DATABASE_URL")]
    pub url: Option<String>,

    /// Schema to read from the live catalog
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct IndexArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Value of the SOURCE_SCHEMA column (defaults to the database name from the URL)
    #[arg(long, value_name = "NAME")]
    pub source: Option<String>,
}

/// Where key listings come from: key files, a live database, or both.
#[derive(clap::Args, Debug, Clone)]
pub struct KeySourceArgs {
    /// Live database to read keys from when no key file is given
    #[arg(long, value_name = "URL", env = "COLSCAN_DATABASE_URL")]
    pub url: Option<String>,

    /// Schema to read from the live catalog
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    /// Foreign-key CSV as written by `foreign-keys -f csv` or the SQL Server script
    #[arg(long, value_name = "FILE")]
    pub foreign_keys: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SchemaXmlArgs {
    #[command(flatten)]
    pub keys: KeySourceArgs,

    /// Primary-key CSV as written by `primary-keys -f csv` or the SQL Server script
    #[arg(long, value_name = "FILE")]
    pub primary_keys: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct JoinPathArgs {
    /// Table the path starts at
    #[arg(value_name = "FROM")]
    pub from: String,

    /// Table the path ends at
    #[arg(value_name = "TO")]
    pub to: String,

    #[command(flatten)]
    pub keys: KeySourceArgs,

    /// SQL dialect of the rendered join (defaults to the URL's engine, else sqlserver)
    #[arg(long, value_enum)]
    pub dialect: Option<DialectArg>,

    /// Database to switch to with USE (SQL Server and MySQL only)
    #[arg(long, value_name = "DATABASE")]
    pub database: Option<String>,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
    /// CSV with a header row
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchArg {
    /// Value contains the search text
    Contains,
    /// Value equals the search text
    Exact,
}

impl From<MatchArg> for MatchMode {
    fn from(m: MatchArg) -> Self {
        match m {
            MatchArg::Contains => MatchMode::Contains,
            MatchArg::Exact => MatchMode::Exact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeCheckArg {
    /// Warn and run the comparison anyway
    Permissive,
    /// Refuse to scan
    Strict,
}

impl From<TypeCheckArg> for TypeCheck {
    fn from(t: TypeCheckArg) -> Self {
        match t {
            TypeCheckArg::Permissive => TypeCheck::Permissive,
            TypeCheckArg::Strict => TypeCheck::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Postgres,
    Mysql,
    Sqlite,
    #[value(alias = "mssql")]
    Sqlserver,
}

impl From<DialectArg> for Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::Mysql,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Sqlserver => Dialect::Mssql,
        }
    }
}
