//! Error type constants for metrics and logging.
//!
//! These constants provide consistent error classification across all crates.

/// No valid identity on the request.
pub const ERROR_UNAUTHENTICATED: &str = "unauthenticated";
/// Record missing or owned by someone else (deliberately merged).
pub const ERROR_NOT_FOUND_OR_FORBIDDEN: &str = "not_found_or_forbidden";
/// Subscription tier does not cover the operation.
pub const ERROR_FORBIDDEN: &str = "forbidden";
/// Malformed or missing input.
pub const ERROR_VALIDATION: &str = "validation_error";
/// Storage quota denial.
pub const ERROR_QUOTA_EXCEEDED: &str = "storage_limit_exceeded";
/// Experience count limit denial.
pub const ERROR_EXPERIENCE_LIMIT: &str = "experience_limit_exceeded";
/// Record store, blob store or identity provider failure.
pub const ERROR_UPSTREAM: &str = "upstream_error";
/// Configuration error.
pub const ERROR_CONFIG: &str = "configuration_error";
