//! Error types for chatbox-db
//!
//! Configuration and engine errors are fatal at startup. Session errors
//! surface lazily, on the first statement that needs a live connection.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for callers that don't care which stage failed.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Loading `config.yaml` or resolving the connection string failed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {} (invalid YAML): {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("could not locate the application directory: {source}")]
    BaseDir {
        #[source]
        source: std::io::Error,
    },

    #[error("no database connection string: set DATABASE_URL or database.main in config.yaml")]
    MissingConnectionString,
}

/// The connection string could not be turned into an engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("database connection string is empty")]
    EmptyUrl,

    #[error("malformed database connection string: {url}")]
    MalformedUrl { url: String },

    #[error("unsupported database scheme '{scheme}' (expected postgres, postgresql or sqlite)")]
    UnsupportedScheme { scheme: String },

    #[error("invalid database connection string {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Using a session failed.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,

    #[error("database unreachable: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl SessionError {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Connection(err),
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_connection_error() {
        let err = SessionError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_connection());
    }

    #[test]
    fn io_error_is_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = SessionError::from(sqlx::Error::Io(io));
        assert!(err.is_connection());
    }

    #[test]
    fn row_not_found_is_database_error() {
        let err = SessionError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, SessionError::Database(_)));
    }

    #[test]
    fn wraps_into_top_level_error() {
        let err: Error = ConfigError::MissingConnectionString.into();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
