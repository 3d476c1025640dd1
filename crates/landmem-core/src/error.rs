//! Error types for landmem operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all landmem crates. Uses `thiserror` for derive macros.
//!
//! Collaborator failures (store, embedder) keep their kind as they travel
//! upward; [`Error::with_operation`] only enriches them with the name of the
//! calling operation and its serialized input.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in landmem operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A by-identifier lookup found no record.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A filter specification or record is internally inconsistent.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backing store rejected or errored on a predicate or similarity request.
    #[error("Query failed in {operation}: {message} (input: {context})")]
    Query {
        /// Operation that issued the query.
        operation: String,
        /// Serialized original input, for diagnosis.
        context: String,
        /// Underlying cause.
        message: String,
    },

    /// The embedder could not produce a vector.
    #[error("Embedding failed: {message} (input: {context})")]
    Embedding {
        /// Text (or operation input) that was being embedded.
        context: String,
        /// Underlying cause.
        message: String,
    },

    /// The store could not persist a record.
    #[error("Persistence failed in {operation}: {message}")]
    Persistence {
        /// Operation that attempted the write.
        operation: String,
        /// Underlying cause.
        message: String,
    },

    /// Generic backend operation failure.
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Create an I/O error carrying the offending path.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a query error.
    pub fn query(
        operation: impl Into<String>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Query {
            operation: operation.into(),
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Embedding {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a generic operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Tag this error with the operation that observed it and that
    /// operation's input.
    ///
    /// Query and persistence failures are re-labelled with the outer
    /// operation (the original label is folded into the message); embedding
    /// failures keep their text context and gain the operation as a prefix.
    /// Every other kind is returned unchanged.
    pub fn with_operation(self, operation: &str, context: impl Into<String>) -> Self {
        match self {
            Self::Query {
                operation: inner,
                message,
                ..
            } => Self::Query {
                operation: operation.to_string(),
                context: context.into(),
                message: if inner == operation {
                    message
                } else {
                    format!("{inner}: {message}")
                },
            },
            Self::Persistence {
                operation: inner,
                message,
            } => Self::Persistence {
                operation: operation.to_string(),
                message: if inner == operation {
                    message
                } else {
                    format!("{inner}: {message}")
                },
            },
            Self::Embedding { context: text, message } => Self::Embedding {
                context: text,
                message: format!("{operation}: {message}"),
            },
            other => other,
        }
    }

    /// Report a failed store read as a query failure of `operation`.
    ///
    /// Query errors are relabelled as in [`Error::with_operation`]. Generic
    /// backend failures (I/O, serialization, operation errors) become
    /// [`Error::Query`] with their display text as the cause. Typed failures
    /// from other layers keep their kind.
    pub fn into_query_failure(self, operation: &str, context: impl Into<String>) -> Self {
        match self {
            Self::Io(_)
            | Self::IoWithPath { .. }
            | Self::Serialization(_)
            | Self::InvalidData(_)
            | Self::Operation(_) => Self::query(operation, context, self.to_string()),
            other => other.with_operation(operation, context),
        }
    }

    /// Report a failed store write as a persistence failure of `operation`.
    ///
    /// The write-side counterpart of [`Error::into_query_failure`]: generic
    /// backend failures become [`Error::Persistence`] with the input folded
    /// into the message.
    pub fn into_persistence_failure(self, operation: &str, context: impl Into<String>) -> Self {
        match self {
            Self::Io(_)
            | Self::IoWithPath { .. }
            | Self::Serialization(_)
            | Self::InvalidData(_)
            | Self::Operation(_) => {
                Self::persistence(operation, format!("{self} (input: {})", context.into()))
            }
            other => other.with_operation(operation, context),
        }
    }

    /// Whether this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this is a query error.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Whether this is an embedding error.
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding { .. })
    }

    /// Whether this is a persistence error.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

/// Result type alias using landmem's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_and_inspectors() {
        assert!(Error::not_found("plot 1").is_not_found());
        assert!(Error::validation("min > max").is_validation());
        assert!(Error::query("filter_records", "{}", "boom").is_query());
        assert!(Error::embedding("text", "model offline").is_embedding());
        assert!(Error::persistence("create", "duplicate id").is_persistence());
        assert!(!Error::config("bad").is_query());
    }

    #[test]
    fn test_query_display_includes_context() {
        let err = Error::query("filter_records", r#"{"plotSizes":["Large"]}"#, "syntax error");
        let msg = err.to_string();
        assert!(msg.contains("filter_records"));
        assert!(msg.contains("plotSizes"));
        assert!(msg.contains("syntax error"));
    }

    #[test]
    fn test_with_operation_relabels_query() {
        let err = Error::query("query_by_predicate", "neighborhood IN ('x')", "table missing")
            .with_operation("hybrid_search", r#"{"threshold":0.75}"#);

        match err {
            Error::Query {
                operation,
                context,
                message,
            } => {
                assert_eq!(operation, "hybrid_search");
                assert!(context.contains("threshold"));
                assert!(message.starts_with("query_by_predicate"));
                assert!(message.contains("table missing"));
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[test]
    fn test_into_query_failure_wraps_backend_errors() {
        let err = Error::operation("table missing").into_query_failure("filter_records", "{}");
        assert!(err.is_query());
        assert!(err.to_string().contains("table missing"));

        let err = Error::validation("min > max").into_query_failure("filter_records", "{}");
        assert!(err.is_validation());

        let err = Error::embedding("text", "offline").into_query_failure("search", "{}");
        assert!(err.is_embedding());
    }

    #[test]
    fn test_into_persistence_failure_wraps_backend_errors() {
        let err =
            Error::operation("connection reset").into_persistence_failure("create_plot", "Lot 7");
        assert!(err.is_persistence());
        let text = err.to_string();
        assert!(text.contains("create_plot"));
        assert!(text.contains("connection reset"));
        assert!(text.contains("Lot 7"));

        let err = Error::persistence("create", "duplicate id")
            .into_persistence_failure("create_plot", "Lot 7");
        assert!(err.is_persistence());
        assert!(err.to_string().contains("create: duplicate id"));

        let err = Error::validation("bad").into_persistence_failure("create_plot", "Lot 7");
        assert!(err.is_validation());
    }

    #[test]
    fn test_with_operation_same_label_keeps_message() {
        let err = Error::query("filter_records", "a", "b").with_operation("filter_records", "c");
        match err {
            Error::Query { message, context, .. } => {
                assert_eq!(message, "b");
                assert_eq!(context, "c");
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[test]
    fn test_with_operation_keeps_embedding_kind() {
        let err = Error::embedding("ocean view", "timeout").with_operation("search", "ignored");
        assert!(err.is_embedding());
        assert!(err.to_string().contains("ocean view"));
        assert!(err.to_string().contains("search: timeout"));
    }

    #[test]
    fn test_with_operation_passes_other_kinds_through() {
        let err = Error::validation("rank range").with_operation("search", "{}");
        assert!(err.is_validation());
    }

    #[test]
    fn test_io_with_path_display() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::io_with_path(io, "/tmp/plots.json");
        assert!(err.to_string().contains("/tmp/plots.json"));
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
