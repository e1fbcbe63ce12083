//! Structured error types for bookshelf-core.
//!
//! Storage failures fall into two classes: "the book does not exist" and
//! everything else. Callers can always tell them apart with
//! [`StoreError::is_not_found`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::models::BookId;

/// Error returned by [`BookStore`](crate::BookStore) operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record matches the requested id
    #[error("book {id} not found")]
    NotFound { id: BookId },

    /// The driver reported a failure while running an operation
    #[error("failed to {operation}: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The caller's deadline elapsed before the backend answered
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// Initial connect or liveness check failed
    #[error("failed to connect to database: {source}")]
    Connect {
        #[source]
        source: sqlx::Error,
    },

    /// The server did not answer the liveness check in time
    #[error("database did not answer within {timeout:?}")]
    ConnectTimeout { timeout: Duration },
}

/// Result type alias for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Wrap a driver error with the name of the failing operation
    pub fn backend(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Backend { operation, source }
    }

    pub fn not_found(id: BookId) -> Self {
        Self::NotFound { id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for every failure that is not "not found".
    ///
    /// Timeouts and construction failures count as backend failures.
    pub fn is_backend(&self) -> bool {
        !self.is_not_found()
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectTimeout { .. })
    }
}

/// Error loading or parsing connection configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed connection option '{0}': expected key=value")]
    MalformedOption(String),

    #[error("unterminated quoted value for '{key}'")]
    UnterminatedQuote { key: String },

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("invalid sslmode '{0}'")]
    InvalidSslMode(String),

    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
