//! Error types for the SQL access layer.

use std::path::PathBuf;
use thiserror::Error;
use uno_handlebars::HandlebarsError;

/// Errors that can occur while building or running a statement.
#[derive(Error, Debug)]
pub enum DaoError {
    /// An identifier contained a quote, a comment sequence or an empty segment.
    #[error("unsafe identifier: {0}")]
    UnsafeIdentifier(String),

    /// A SQL file resolved outside the SQL root.
    #[error("insecure file access: {}", .0.display())]
    InsecureFileAccess(PathBuf),

    /// A SQL file does not exist.
    #[error("SQL file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A SQL file failed to parse or render.
    #[error("SQL template error: {0}")]
    Template(String),

    /// No binder is registered under the name.
    #[error("no method: bind{0}")]
    UnknownBinder(String),

    /// `sql`/`file` was called while a statement was already set.
    #[error("a statement is already pending: {0}")]
    StatementPending(String),

    /// An executing method was called before any SQL was set.
    #[error("no SQL statement to execute")]
    MissingStatement,

    /// A query expected to return at most one row returned more.
    #[error("returned more than one row ({count} rows)")]
    TooManyRows {
        /// Number of rows returned.
        count: usize,
    },

    /// A row has no column with the requested name.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A binder rejected its input.
    #[error("binder '{name}' failed: {message}")]
    Binder {
        /// Binder name.
        name: String,
        /// Failure description.
        message: String,
    },

    /// A row could not be converted to the requested type.
    #[error("decode error: {0}")]
    Decode(String),

    /// Error reported by SQLite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection could not be opened or used.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Dao operations.
pub type DaoResult<T> = Result<T, DaoError>;

impl From<HandlebarsError> for DaoError {
    fn from(err: HandlebarsError) -> Self {
        match err {
            HandlebarsError::InsecurePath(path) => DaoError::InsecureFileAccess(path),
            HandlebarsError::TemplateNotFound(path) => DaoError::TemplateNotFound(path),
            other => DaoError::Template(other.to_string()),
        }
    }
}

impl From<DaoError> for uno_core::Error {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::InsecureFileAccess(path) => {
                uno_core::Error::InsecureFileAccess(path.display().to_string())
            }
            other => uno_core::Error::Database(Box::new(other)),
        }
    }
}
