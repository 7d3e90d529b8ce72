//! Error types for fecom-reports.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// One-line remediation hint printed after a fatal pipeline error.
pub const FAILURE_HINT: &str = "Hint: check the connection settings and column names.";

/// Main error type for report operations.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, bad connection parameters, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query name that the catalog does not contain.
    #[error("Query named '{name}' not found in {source_name}")]
    QueryNotFound { name: String, source_name: String },

    /// Query execution errors (syntax errors, permissions, dropped connections, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A renderer could not process its input (empty result, missing column, backend failure).
    #[error("Render error: {0}")]
    Render(String),

    /// Spreadsheet export failures.
    #[error("Export error: {0}")]
    Export(String),

    /// Filesystem errors outside of rendering and export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (broken invariants, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a query-not-found error for the given name and catalog source.
    pub fn query_not_found(name: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::QueryNotFound {
            name: name.into(),
            source_name: source_name.into(),
        }
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a render error with the given message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::QueryNotFound { .. } => "Query Not Found",
            Self::Query(_) => "Query Error",
            Self::Render(_) => "Render Error",
            Self::Export(_) => "Export Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ReportError.
pub type Result<T> = std::result::Result<T, ReportError>;
