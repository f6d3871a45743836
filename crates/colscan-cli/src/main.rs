//! colscan CLI - catalog-driven column value scanner

use colscan_cli::backend::{self, BackendError};
use colscan_cli::cli;
use colscan_cli::index::{self, IndexEntry};
use colscan_cli::keys;
use colscan_cli::output;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use colscan_core::{
    default_script_filename, enumerate_foreign_keys, enumerate_primary_keys, find_join_path,
    render_foreign_key_script, render_join_sql, render_primary_key_script, render_scan_script,
    scan_table, CatalogSource, Dialect, ForeignKeyRow, JoinPathReport, MatchCounter,
    PrimaryKeyRow, ScanError, ScanRequest, SchemaDiagram, TableRef,
};
use is_terminal::IsTerminal;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{
    Args, Command, ConnectionArgs, FindColumnArgs, IndexArgs, JoinPathArgs, KeySourceArgs,
    OutputFormat, ScanArgs, ScanTarget, SchemaXmlArgs, ScriptCommand, ScriptScanArgs,
};

/// The scan could not complete (connection lost, table missing, query failed).
const EXIT_FAILURE: u8 = 1;
/// Configuration error (bad URL, bad literal, missing input).
const EXIT_CONFIG_ERROR: u8 = 66;

/// Schema SQL Server scripts fall back to.
const MSSQL_DEFAULT_SCHEMA: &str = "dbo";

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("colscan: error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(scan_error) = err.downcast_ref::<ScanError>() {
        return match scan_error {
            ScanError::UnknownColumn { .. } | ScanError::IncompatibleLiteral { .. } => {
                EXIT_CONFIG_ERROR
            }
            _ => EXIT_FAILURE,
        };
    }
    if let Some(BackendError::Connect(_)) = err.downcast_ref::<BackendError>() {
        return EXIT_FAILURE;
    }
    EXIT_CONFIG_ERROR
}

fn run(args: &Args) -> Result<()> {
    let colored = args.output.is_none() && io::stdout().is_terminal();

    match &args.command {
        Command::Scan(scan) => run_scan(args, scan, colored),
        Command::PrimaryKeys(connection) => run_primary_keys(args, connection, colored),
        Command::ForeignKeys(connection) => run_foreign_keys(args, connection, colored),
        Command::SchemaXml(xml) => run_schema_xml(args, xml),
        Command::JoinPath(join) => run_join_path(args, join, colored),
        Command::Script(ScriptCommand::Scan(script)) => run_scan_script(args, script),
        Command::Script(ScriptCommand::PrimaryKeys(script)) => {
            let sql = render_primary_key_script(script.database.as_deref());
            let path = script_output_path(args.output.as_deref(), || {
                key_script_filename("primary-keys", script.database.as_deref())
            });
            write_output(path.as_deref(), &sql)
        }
        Command::Script(ScriptCommand::ForeignKeys(script)) => {
            let sql = render_foreign_key_script(script.database.as_deref());
            let path = script_output_path(args.output.as_deref(), || {
                key_script_filename("foreign-keys", script.database.as_deref())
            });
            write_output(path.as_deref(), &sql)
        }
        Command::FindColumn(find) => run_find_column(args, find, colored),
        Command::Index(index_args) => run_index(args, index_args),
    }
}

fn run_scan(args: &Args, scan: &ScanArgs, colored: bool) -> Result<()> {
    let request = build_request(&scan.target, scan.connection.schema.as_deref())?;
    let live = connect(&scan.connection.url, args.quiet)?;

    let report = scan_table(live.as_ref(), &request)?;
    tracing::info!(
        table = %report.diagnostics.target_table,
        matches = report.matches.len(),
        "scan finished"
    );

    let rendered = match args.format {
        OutputFormat::Table => output::format_scan_report(&report, args.quiet, colored),
        OutputFormat::Json => {
            output::format_json(&report, args.compact).context("Failed to export JSON")?
        }
        OutputFormat::Csv => output::format_scan_csv(&report).context("Failed to export CSV")?,
    };
    write_output(args.output.as_deref(), &rendered)
}

fn run_primary_keys(args: &Args, connection: &ConnectionArgs, colored: bool) -> Result<()> {
    let live = connect(&connection.url, args.quiet)?;
    let rows = enumerate_primary_keys(live.as_ref(), connection.schema.as_deref())?;

    let rendered = match args.format {
        OutputFormat::Table => output::format_primary_keys(&rows, colored),
        OutputFormat::Json => {
            output::format_json(&rows, args.compact).context("Failed to export JSON")?
        }
        OutputFormat::Csv => output::format_csv(&rows).context("Failed to export CSV")?,
    };
    write_output(args.output.as_deref(), &rendered)
}

fn run_foreign_keys(args: &Args, connection: &ConnectionArgs, colored: bool) -> Result<()> {
    let live = connect(&connection.url, args.quiet)?;
    let rows = enumerate_foreign_keys(live.as_ref(), connection.schema.as_deref())?;

    let rendered = match args.format {
        OutputFormat::Table => output::format_foreign_keys(&rows, colored),
        OutputFormat::Json => {
            output::format_json(&rows, args.compact).context("Failed to export JSON")?
        }
        OutputFormat::Csv => output::format_csv(&rows).context("Failed to export CSV")?,
    };
    write_output(args.output.as_deref(), &rendered)
}

/// Key listings from files where given, from the live catalog otherwise.
///
/// The connection is opened on first use, so file-only runs never connect.
struct KeyLoader<'a> {
    source: &'a KeySourceArgs,
    quiet: bool,
    live: Option<Box<dyn LiveBackend>>,
}

impl<'a> KeyLoader<'a> {
    fn new(source: &'a KeySourceArgs, quiet: bool) -> Self {
        Self {
            source,
            quiet,
            live: None,
        }
    }

    fn live(&mut self, missing_file: &str) -> Result<&dyn LiveBackend> {
        if self.live.is_none() {
            let url = self.source.url.as_deref().ok_or_else(|| {
                anyhow!("no live database to read keys from: pass {missing_file} FILE or --url URL")
            })?;
            self.live = Some(connect(url, self.quiet)?);
        }
        self.live
            .as_deref()
            .ok_or_else(|| anyhow!("no live database connection"))
    }

    fn primary_keys(&mut self, file: Option<&Path>) -> Result<Vec<PrimaryKeyRow>> {
        if let Some(path) = file {
            return Ok(keys::read_primary_keys(path)?);
        }
        let schema = self.source.schema.clone();
        let live = self.live("--primary-keys")?;
        Ok(enumerate_primary_keys(live, schema.as_deref())?)
    }

    fn foreign_keys(&mut self) -> Result<Vec<ForeignKeyRow>> {
        if let Some(path) = &self.source.foreign_keys {
            return Ok(keys::read_foreign_keys(path)?);
        }
        let schema = self.source.schema.clone();
        let live = self.live("--foreign-keys")?;
        Ok(enumerate_foreign_keys(live, schema.as_deref())?)
    }
}

fn run_schema_xml(args: &Args, xml: &SchemaXmlArgs) -> Result<()> {
    let mut loader = KeyLoader::new(&xml.keys, args.quiet);
    let primary_keys = loader.primary_keys(xml.primary_keys.as_deref())?;
    let foreign_keys = loader.foreign_keys()?;

    let diagram = SchemaDiagram::from_keys(&primary_keys, &foreign_keys);
    tracing::info!(tables = diagram.tables.len(), "schema diagram laid out");
    write_output(args.output.as_deref(), &diagram.to_xml())
}

fn run_join_path(args: &Args, join: &JoinPathArgs, colored: bool) -> Result<()> {
    let foreign_keys = KeyLoader::new(&join.keys, args.quiet).foreign_keys()?;
    let path = find_join_path(&foreign_keys, &join.from, &join.to)?;
    let dialect = join_dialect(join);

    let sql = path.as_ref().map(|path| {
        render_join_sql(
            dialect,
            path,
            join.keys.schema.as_deref(),
            join.database.as_deref(),
        )
    });
    if path.is_none() {
        tracing::warn!(from = %join.from, to = %join.to, "tables are not connected");
    }
    let report = JoinPathReport {
        from: join.from.clone(),
        to: join.to.clone(),
        path,
        sql,
    };

    let rendered = match args.format {
        OutputFormat::Table => output::format_join_path(&report, colored),
        OutputFormat::Json => {
            output::format_json(&report, args.compact).context("Failed to export JSON")?
        }
        OutputFormat::Csv => {
            output::format_join_path_csv(&report).context("Failed to export CSV")?
        }
    };
    write_output(args.output.as_deref(), &rendered)
}

/// `--dialect` first, then the engine of `--url`, then SQL Server.
fn join_dialect(join: &JoinPathArgs) -> Dialect {
    join.dialect
        .map(Dialect::from)
        .or_else(|| {
            join.keys
                .url
                .as_deref()
                .and_then(backend::DatabaseType::from_url)
                .map(backend::DatabaseType::dialect)
        })
        .unwrap_or(Dialect::Mssql)
}

fn run_scan_script(args: &Args, script: &ScriptScanArgs) -> Result<()> {
    let request = build_request(&script.target, script.schema.as_deref())?;
    let sql = render_scan_script(&request, script.database.as_deref());

    let path = script_output_path(args.output.as_deref(), || {
        default_script_filename(
            script.database.as_deref(),
            request.table.schema.as_deref().unwrap_or(MSSQL_DEFAULT_SCHEMA),
            &request.table.name,
        )
    });
    write_output(path.as_deref(), &sql)
}

fn run_find_column(args: &Args, find: &FindColumnArgs, colored: bool) -> Result<()> {
    let entries = match (&find.index, &find.url) {
        (Some(path), _) => index::read_index(path)?,
        (None, Some(url)) => {
            let live = connect(url, args.quiet)?;
            let source = backend::source_label_from_url(url);
            live.list_columns(find.schema.as_deref())?
                .iter()
                .map(|column| IndexEntry::from_catalog(&source, column))
                .collect()
        }
        (None, None) => bail!("find-column needs --index FILE or --url URL"),
    };

    let found = index::find_columns(&entries, &find.fragment);
    tracing::debug!(fragment = %find.fragment, hits = found.len(), "column search");

    let rendered = match args.format {
        OutputFormat::Table => output::format_columns(&found, colored),
        OutputFormat::Json => {
            output::format_json(&found, args.compact).context("Failed to export JSON")?
        }
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            let owned: Vec<IndexEntry> = found.into_iter().cloned().collect();
            index::write_index(&mut buffer, &owned)?;
            String::from_utf8_lossy(&buffer).into_owned()
        }
    };
    write_output(args.output.as_deref(), &rendered)
}

fn run_index(args: &Args, index_args: &IndexArgs) -> Result<()> {
    let connection = &index_args.connection;
    let live = connect(&connection.url, args.quiet)?;
    let source = index_args
        .source
        .clone()
        .unwrap_or_else(|| backend::source_label_from_url(&connection.url));

    let entries: Vec<IndexEntry> = live
        .list_columns(connection.schema.as_deref())?
        .iter()
        .map(|column| IndexEntry::from_catalog(&source, column))
        .collect();

    let mut buffer = Vec::new();
    index::write_index(&mut buffer, &entries)?;
    write_output(args.output.as_deref(), &String::from_utf8_lossy(&buffer))
}

fn build_request(target: &ScanTarget, schema: Option<&str>) -> Result<ScanRequest> {
    let table = TableRef::parse(&target.table)
        .ok_or_else(|| anyhow!("invalid table name: {}", target.table))?
        .with_default_schema(schema);

    Ok(ScanRequest::new(
        table,
        target.search.clone(),
        target.candidate_a.clone(),
        target.candidate_b.clone(),
    )
    .excluding(target.exclude.iter().cloned())
    .with_match_mode(target.match_mode.into())
    .with_type_check(target.type_check.into()))
}

trait LiveBackend: CatalogSource + MatchCounter {}

impl<T: CatalogSource + MatchCounter> LiveBackend for T {}

/// Connect to a live database.
fn connect(url: &str, quiet: bool) -> Result<Box<dyn LiveBackend>> {
    // Warn if credentials appear to be embedded in the URL
    if !quiet && backend::url_has_credentials(url) {
        eprintln!(
            "colscan: warning: Database credentials in --url may be logged in shell history. \
             Consider setting COLSCAN_DATABASE_URL instead."
        );
    }
    open_backend(url)
}

#[cfg(feature = "metadata-provider")]
fn open_backend(url: &str) -> Result<Box<dyn LiveBackend>> {
    let live = backend::SqlxBackend::connect(url)?;
    tracing::debug!(database = ?live.database_type(), "connected");
    Ok(Box::new(live))
}

#[cfg(not(feature = "metadata-provider"))]
fn open_backend(url: &str) -> Result<Box<dyn LiveBackend>> {
    backend::DatabaseType::for_url(url)?;
    Err(BackendError::Unavailable.into())
}

fn key_script_filename(stem: &str, database: Option<&str>) -> String {
    match database {
        Some(database) => {
            let safe: String = database
                .chars()
                .map(|ch| if ch.is_alphanumeric() { ch } else { '_' })
                .collect();
            format!("{stem}-{safe}.sql")
        }
        None => format!("{stem}.sql"),
    }
}

/// `-o DIR` writes the script under its default name inside `DIR`.
fn script_output_path(
    output: Option<&Path>,
    default_name: impl FnOnce() -> String,
) -> Option<PathBuf> {
    let output = output?;
    if output.is_dir() {
        Some(output.join(default_name()))
    } else {
        Some(output.to_path_buf())
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
