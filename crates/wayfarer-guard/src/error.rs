//! Guard error types.

use wayfarer_core::{
    ERROR_CONFIG, ERROR_EXPERIENCE_LIMIT, ERROR_FORBIDDEN, ERROR_NOT_FOUND_OR_FORBIDDEN,
    ERROR_QUOTA_EXCEEDED, ERROR_UNAUTHENTICATED, ERROR_UPSTREAM, ERROR_VALIDATION,
};

use crate::quota::QuotaSnapshot;
use crate::tier::Tier;

/// Guard error.
///
/// A missing record and a record owned by someone else are both reported as
/// [`GuardError::NotFoundOrForbidden`]; callers must not be able to tell the
/// two apart.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// No valid identity on the request.
    #[error("authentication required")]
    Unauthenticated,

    /// Record does not exist or is not owned by the requester.
    #[error("not found")]
    NotFoundOrForbidden,

    /// The requester's subscription tier does not cover the operation.
    #[error("this feature requires the {required} plan or higher")]
    Forbidden {
        /// Lowest tier that is allowed to perform the operation.
        required: Tier,
    },

    /// Malformed or missing input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Upload would exceed the storage limit.
    #[error("storage limit exceeded")]
    QuotaExceeded(QuotaSnapshot),

    /// Experience count would exceed the tier limit.
    #[error("experience limit of {limit} reached")]
    ExperienceLimit {
        /// Maximum experiences allowed for the tier.
        limit: u32,
    },

    /// Record store, blob store or identity provider failure. Safe to retry.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Tier catalog or environment misconfiguration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GuardError {
    /// Create an upstream error from any error type.
    #[inline]
    pub fn upstream<E: std::fmt::Display>(err: E) -> Self {
        Self::Upstream(err.to_string())
    }

    /// Create a validation error.
    #[inline]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Get the error type string for metrics and response bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            GuardError::Unauthenticated => ERROR_UNAUTHENTICATED,
            GuardError::NotFoundOrForbidden => ERROR_NOT_FOUND_OR_FORBIDDEN,
            GuardError::Forbidden { .. } => ERROR_FORBIDDEN,
            GuardError::Validation(_) => ERROR_VALIDATION,
            GuardError::QuotaExceeded(_) => ERROR_QUOTA_EXCEEDED,
            GuardError::ExperienceLimit { .. } => ERROR_EXPERIENCE_LIMIT,
            GuardError::Upstream(_) => ERROR_UPSTREAM,
            GuardError::Configuration(_) => ERROR_CONFIG,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, GuardError::Upstream(_))
    }
}

#[cfg(feature = "sql")]
impl From<sqlx::Error> for GuardError {
    fn from(err: sqlx::Error) -> Self {
        Self::upstream(err)
    }
}

impl From<std::io::Error> for GuardError {
    fn from(err: std::io::Error) -> Self {
        Self::upstream(err)
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::upstream(err)
    }
}
