//! Storage error types for Cabinet

use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error types
#[derive(Error, Debug)]
pub enum StoreError {
    /// A path segment does not exist in the Document
    #[error("{segment} not found in {context}")]
    AttributeMissing { segment: String, context: String },

    /// A value could not be converted to the requested return type
    #[error("Cannot convert {value} to {target}: {message}")]
    TypeCoercion {
        value: String,
        target: String,
        message: String,
    },

    /// The backend could not be reached or did not produce a Document
    #[error("Backend unavailable ({backend}): {message}")]
    BackendUnavailable { backend: String, message: String },

    /// Caller supplied an argument that can never succeed
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A data, cache or config file does not hold a valid JSON object
    #[error("{path} is not a valid JSON document: {message}")]
    MalformedDocument { path: PathBuf, message: String },

    /// Directory creation failed
    #[error("Directory creation failed for {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File read/write failed
    #[error("IO error on {path} ({operation}): {source}")]
    IoError {
        path: PathBuf,
        operation: IoOperation,
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Path resolution failed
    #[error("Path resolution failed: {message}")]
    PathResolutionError { message: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// IO operation type for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Read,
    Write,
    Delete,
}

impl std::fmt::Display for IoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoOperation::Read => write!(f, "read"),
            IoOperation::Write => write!(f, "write"),
            IoOperation::Delete => write!(f, "delete"),
        }
    }
}

impl StoreError {
    /// Create an attribute missing error
    pub fn attribute_missing(segment: impl Into<String>, context: impl Into<String>) -> Self {
        StoreError::AttributeMissing {
            segment: segment.into(),
            context: context.into(),
        }
    }

    /// Create a type coercion error
    pub fn type_coercion(
        value: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        StoreError::TypeCoercion {
            value: value.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a backend unavailable error
    pub fn backend_unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::BackendUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a malformed document error
    pub fn malformed(path: PathBuf, message: impl Into<String>) -> Self {
        StoreError::MalformedDocument {
            path,
            message: message.into(),
        }
    }

    /// Create a directory creation failed error
    pub fn directory_creation_failed(path: PathBuf, source: std::io::Error) -> Self {
        StoreError::DirectoryCreationFailed { path, source }
    }

    /// Create an IO error
    pub fn io_error(path: PathBuf, operation: IoOperation, source: std::io::Error) -> Self {
        StoreError::IoError {
            path,
            operation,
            source,
        }
    }

    /// Create a validation error
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a path resolution error
    pub fn path_resolution_error(message: impl Into<String>) -> Self {
        StoreError::PathResolutionError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal(message.into())
    }

    /// Whether the permissive store facade may log this error and carry on.
    ///
    /// Only programmer errors (`InvalidArgument`) escape to the caller.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StoreError::InvalidArgument { .. })
    }
}
