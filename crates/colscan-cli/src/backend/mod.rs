//! Live database backends for the scanner.
//!
//! Connections go through SQLx and cover PostgreSQL, MySQL and SQLite.
//! SQL Server has no SQLx driver; for it the CLI renders a standalone script
//! instead (`colscan script`).

#[cfg(feature = "metadata-provider")]
mod sqlx_backend;

#[cfg(feature = "metadata-provider")]
pub use sqlx_backend::SqlxBackend;

use colscan_core::Dialect;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unsupported database URL scheme: {0}")]
    UnsupportedUrl(String),

    #[error(
        "SQL Server cannot be scanned over a live connection; \
         render a script with `colscan script scan` and run it with sqlcmd"
    )]
    SqlServerUrl,

    #[error("this build of colscan has no live database support")]
    Unavailable,

    #[error("failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to connect: {0}")]
    Connect(String),
}

/// Database type inferred from connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Postgres,
    Mysql,
    Sqlite,
}

impl DatabaseType {
    /// Infer database type from a connection URL.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::Postgres)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::Mysql)
        } else if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }

    /// Like [`DatabaseType::from_url`], but explains why a URL is refused.
    pub fn for_url(url: &str) -> Result<Self, BackendError> {
        if let Some(db_type) = Self::from_url(url) {
            return Ok(db_type);
        }
        let scheme = url.split_once(':').map_or("", |(scheme, _)| scheme);
        if matches!(scheme, "mssql" | "sqlserver") {
            return Err(BackendError::SqlServerUrl);
        }
        Err(BackendError::UnsupportedUrl(scheme.to_string()))
    }

    pub fn dialect(self) -> Dialect {
        match self {
            Self::Postgres => Dialect::Postgres,
            Self::Mysql => Dialect::Mysql,
            Self::Sqlite => Dialect::Sqlite,
        }
    }
}

/// True when the URL appears to carry a user name or password.
pub fn url_has_credentials(url: &str) -> bool {
    url.contains('@') && !url.starts_with("sqlite")
}

/// Database name taken from a connection URL, for labelling index rows.
///
/// `postgres://host/plant?sslmode=require` gives `plant`,
/// `sqlite:///data/plant.db` gives `plant`.
pub fn source_label_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let tail = without_query
        .rsplit(['/', ':'])
        .find(|part| !part.is_empty())
        .unwrap_or("");

    Path::new(tail)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("live")
        .to_string()
}
