//! Top-level error types for the governance domain.
//!
//! [`GovernanceError`] covers conditions that stop a command before it talks
//! to GitHub: unreadable or invalid configuration documents and missing CI
//! context. They fail fast.
//!
//! [`GitHubError`] is returned by every port trait method. Reconcilers catch
//! it per item, log it, and move on; there are no retries anywhere. The next
//! scheduled run is what converges state after a transient failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration-level errors
// ---------------------------------------------------------------------------

/// Errors that prevent a command from starting.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum GovernanceError {
    /// A configuration document could not be parsed.
    #[error("Failed to parse {document}: {message}")]
    InvalidDocument {
        /// Label identifying the document (usually its path).
        document: String,
        /// Parser message.
        message: String,
    },

    /// A document parsed but a required key is missing or a value is out of range.
    #[error("Invalid configuration in {document}: {message}")]
    ConfigurationError {
        /// Label identifying the document (usually its path).
        document: String,
        /// Description of the configuration problem.
        message: String,
    },

    /// A required CI context value (environment variable, event payload
    /// field) is not available.
    #[error("Missing required context: {name}")]
    MissingContext {
        /// Name of the missing value.
        name: String,
    },
}

impl GovernanceError {
    pub(crate) fn invalid_document(document: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidDocument {
            document: document.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn configuration(document: &str, message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            document: document.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Remote API errors
// ---------------------------------------------------------------------------

/// A failed GitHub API call, classified by what the caller can do about it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHubError {
    /// The resource does not exist, or the token cannot see it (404).
    #[error("Not found: {resource}")]
    NotFound {
        /// Human-readable description of what was requested.
        resource: String,
    },

    /// The primary or secondary rate limit was hit.
    #[error("Rate limited by GitHub: {message}")]
    RateLimited { message: String },

    /// The token lacks the scope or role needed (401/403 without rate-limit headers).
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Any other non-success HTTP status.
    #[error("GitHub API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {message}")]
    InvalidResponse { message: String },
}

impl GitHubError {
    /// Returns `true` for [`GitHubError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}
