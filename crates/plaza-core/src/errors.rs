//! Categorized errors shared by the Plaza stores
//!
//! Provides structured error types that enable:
//! - Categorized error handling (network vs storage vs input)
//! - Retry decisions for transient failures
//! - Conversion of transport failures into store-level errors

use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Categories
// ============================================================================

/// High-level error categories for presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network connectivity or remote rejection
    Network,
    /// An operation exceeded its deadline
    Timeout,
    /// Referenced entity does not exist
    NotFound,
    /// Caller supplied an invalid argument
    Invalid,
    /// Local key-value storage failure
    Storage,
    /// Encoding or decoding failure
    Serialization,
    /// Configuration could not be loaded or is invalid
    Config,
}

impl ErrorCategory {
    /// Transient errors may resolve on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }

    /// Get a short label for this category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::Timeout => "Timeout",
            Self::NotFound => "Not Found",
            Self::Invalid => "Invalid",
            Self::Storage => "Storage",
            Self::Serialization => "Serialization",
            Self::Config => "Config",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Failure of an outbound request (page fetch, reaction submit, login).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never completed (connection refused, reset, DNS).
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete before its deadline.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline that expired
        timeout_ms: u64,
    },

    /// The remote answered with a failure status.
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// Remote status code
        status: u16,
        /// Remote message
        message: String,
    },
}

impl TransportError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a rejection error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

// ============================================================================
// Plaza Error
// ============================================================================

/// Error returned by Plaza store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlazaError {
    /// Outbound request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind ("post", "thread")
        kind: &'static str,
        /// Entity identifier
        id: String,
    },

    /// Caller supplied an invalid argument or the operation is not allowed
    /// in the current state.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Local key-value storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PlazaError {
    /// Create a not-found error.
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(TransportError::Timeout { .. }) => ErrorCategory::Timeout,
            Self::Transport(_) => ErrorCategory::Network,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Invalid(_) => ErrorCategory::Invalid,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether retrying the operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.category().is_transient()
    }
}

impl From<serde_json::Error> for PlazaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for Plaza operations.
pub type Result<T> = std::result::Result<T, PlazaError>;
