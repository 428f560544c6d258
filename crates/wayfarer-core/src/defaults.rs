//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;
/// One gibibyte.
pub const GIB: u64 = 1024 * MIB;

// ============================================================================
// Server Defaults
// ============================================================================

/// Default HTTP listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
/// Default maximum upload body size accepted by the HTTP layer.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Signed URL Defaults
// ============================================================================

/// Lifetime of an issued download link.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 60;
/// Upper bound accepted for the download link lifetime.
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 300;
/// Minimum signing secret length in bytes.
pub const MIN_SIGNING_SECRET_BYTES: usize = 16;
/// Default public base URL used when building signed links.
pub const DEFAULT_BLOB_PUBLIC_URL: &str = "http://127.0.0.1:8080/blobs";

// ============================================================================
// Quota Defaults
// ============================================================================

/// Sentinel experience id meaning "no experience".
pub const UNASSIGNED_EXPERIENCE: &str = "unassigned";
/// Tier required for bulk metadata updates.
pub const DEFAULT_BULK_MIN_TIER: &str = "traveler";
/// Maximum ids accepted in one bulk request.
pub const DEFAULT_MAX_BULK_IDS: usize = 500;
/// Re-check the storage limit after committing an upload.
pub const DEFAULT_RECHECK_ON_COMMIT: bool = true;

// ============================================================================
// Tier Catalog Defaults
// ============================================================================

/// Free tier storage limit.
pub const DEFAULT_FREE_STORAGE_BYTES: u64 = 500 * MIB;
/// Explorer tier storage limit.
pub const DEFAULT_EXPLORER_STORAGE_BYTES: u64 = 5 * GIB;
/// Traveler tier storage limit.
pub const DEFAULT_TRAVELER_STORAGE_BYTES: u64 = 25 * GIB;
/// Enterprise tier storage limit.
pub const DEFAULT_ENTERPRISE_STORAGE_BYTES: u64 = 100 * GIB;

/// Free tier experience limit.
pub const DEFAULT_FREE_MAX_EXPERIENCES: u32 = 3;
/// Explorer tier experience limit.
pub const DEFAULT_EXPLORER_MAX_EXPERIENCES: u32 = 25;
/// Traveler tier experience limit.
pub const DEFAULT_TRAVELER_MAX_EXPERIENCES: u32 = 100;
/// Enterprise tier experience limit.
pub const DEFAULT_ENTERPRISE_MAX_EXPERIENCES: u32 = 10_000;

/// Free tier export limit.
pub const DEFAULT_FREE_MAX_EXPORTS: u32 = 1;
/// Explorer tier export limit.
pub const DEFAULT_EXPLORER_MAX_EXPORTS: u32 = 10;
/// Traveler tier export limit.
pub const DEFAULT_TRAVELER_MAX_EXPORTS: u32 = 50;
/// Enterprise tier export limit.
pub const DEFAULT_ENTERPRISE_MAX_EXPORTS: u32 = 1_000;

// ============================================================================
// Record Store Defaults
// ============================================================================

/// Default record store backend.
pub const DEFAULT_STORE_BACKEND: &str = "sql";
/// Default maximum pooled database connections.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
/// Default minimum pooled database connections.
pub const DEFAULT_DB_MIN_CONNECTIONS: u32 = 1;
/// Default database connect timeout in seconds.
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Identity Defaults
// ============================================================================

/// Default identity provider.
pub const DEFAULT_IDENTITY_PROVIDER: &str = "static";
/// Default timeout for remote identity lookups in seconds.
pub const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 5;

/// Bearer token hash length (SHA-224 hex = 56 chars).
pub const TOKEN_HASH_LEN: usize = 56;
