//! Error types for store operations.

use std::fmt;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the shared store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached, rejected the credentials, or the
    /// link dropped mid-statement.
    #[error("{backend} backend unreachable: {message}")]
    Connection {
        /// Backend name.
        backend: &'static str,
        /// Driver message.
        message: String,
    },

    /// The backend was reachable but rejected a statement.
    #[error("statement failed: {message} [{statement}]")]
    Query {
        /// SQL text of the failing statement.
        statement: String,
        /// Driver message.
        message: String,
    },

    /// A row did not have the expected shape.
    #[error("unexpected row shape: {0}")]
    DataShape(String),
}

impl StoreError {
    /// Creates a connection error.
    pub fn connection(backend: &'static str, err: impl fmt::Display) -> Self {
        Self::Connection {
            backend,
            message: err.to_string(),
        }
    }

    /// Creates a query error for the given statement text.
    pub fn query(statement: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Query {
            statement: statement.into(),
            message: err.to_string(),
        }
    }

    /// Returns true if the backend could not be reached.
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }
}
