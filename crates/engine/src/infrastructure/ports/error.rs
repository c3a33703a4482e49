//! Error types for port operations.

use std::time::Duration;

/// Repository operation errors with context for debugging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepoError {
    /// Record not found - includes record type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Store operation failed - includes operation name for tracing.
    #[error("Store error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl RepoError {
    /// Create a NotFound error with record type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Outcome classification for a generation attempt.
///
/// Classified once at the service boundary; callers never inspect status codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Missing avatar or garment reference. Raised before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Rate limiting, timeout or server-side failure. Retryable.
    #[error("Generation service temporarily failed: {0}")]
    Transient(String),

    /// Quota exhausted, invalid image or malformed response. Not retryable.
    #[error("Generation service rejected the request: {0}")]
    Terminal(String),
}

impl GenerationError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal(message.into())
    }

    /// A request that exceeded its time budget
    pub fn timed_out(after: Duration) -> Self {
        Self::Transient(format!("request timed out after {}s", after.as_secs()))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("Compose failed: {0}")]
    Failed(String),
    #[error("Compose timed out after {0}s")]
    Timeout(u64),
    #[error("Compose service unavailable")]
    Unavailable,
}
