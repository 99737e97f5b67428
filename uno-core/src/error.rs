// Error types for the uno core

use http::StatusCode;
use thiserror::Error;
use uno_events::EventBusError;
use uno_handlebars::HandlebarsError;

/// Boxed error from a collaborator crate (database, user code).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missed dependency: {0}")]
    UnresolvedDependency(String),

    #[error("cyclic dependency: {0}")]
    CyclicDependency(String),

    /// A factory or handler asked for an argument it never declared
    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("dependency '{name}' is not a {expected}")]
    DependencyType { name: String, expected: &'static str },

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("no method: {0}")]
    NoSuchMethod(String),

    #[error("insecure file access: {0}")]
    InsecureFileAccess(String),

    #[error("template error: {0}")]
    Template(String),

    /// A required query/form key was absent or empty
    #[error("required input missing: {0}")]
    MissingInput(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Event(#[from] EventBusError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[source] BoxError),

    /// Failure raised by application code inside a handler
    #[error("{0}")]
    Handler(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convenience constructor for handler failures.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }

    /// HTTP status reported when this error ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Error::MissingInput(_) | Error::Deserialization(_) => StatusCode::BAD_REQUEST,
            Error::InsecureFileAccess(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    /// Name of the variant, used by error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnresolvedDependency(_) => "UnresolvedDependency",
            Error::CyclicDependency(_) => "CyclicDependency",
            Error::MissingArgument(_) => "MissingArgument",
            Error::DependencyType { .. } => "DependencyType",
            Error::RouteNotFound(_) => "RouteNotFound",
            Error::NoSuchMethod(_) => "NoSuchMethod",
            Error::InsecureFileAccess(_) => "InsecureFileAccess",
            Error::Template(_) => "Template",
            Error::MissingInput(_) => "MissingInput",
            Error::Serialization(_) => "Serialization",
            Error::Deserialization(_) => "Deserialization",
            Error::Event(_) => "Event",
            Error::Config(_) => "Config",
            Error::Database(_) => "Database",
            Error::Handler(_) => "Handler",
            Error::Io(_) => "Io",
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Error::UnresolvedDependency(_))
    }
}

impl From<HandlebarsError> for Error {
    fn from(err: HandlebarsError) -> Self {
        match err {
            HandlebarsError::InsecurePath(path) => {
                Error::InsecureFileAccess(path.display().to_string())
            }
            HandlebarsError::Io(io) => Error::Io(io),
            other => Error::Template(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result alias used throughout the core.
pub type Result<T, E = Error> = std::result::Result<T, E>;
