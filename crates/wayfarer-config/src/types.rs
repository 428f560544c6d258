//! Configuration type definitions for the HTTP server, record store, blob
//! store, identity provider, quota policy, metrics, and logging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Largest accepted request body, in bytes. Uploads above this are
    /// rejected before the quota check.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Grace period for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_upload_bytes: default_max_upload_bytes(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "sql" or "memory".
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Database URL (postgres:// or sqlite:). Required for the sql backend.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Create tables on startup if they do not exist.
    #[serde(default = "default_init_schema")]
    pub init_schema: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            database_url: None,
            max_connections: default_db_max_connections(),
            min_connections: default_db_min_connections(),
            connect_timeout_secs: default_db_connect_timeout_secs(),
            init_schema: default_init_schema(),
        }
    }
}

/// Blob store and download link configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Backend: "fs" or "memory".
    #[serde(default = "default_blob_backend")]
    pub backend: String,
    /// Root directory for the fs backend.
    #[serde(default = "default_blob_root")]
    pub root: String,
    /// Externally reachable base URL of the blob route.
    #[serde(default = "default_blob_public_url")]
    pub public_url: String,
    /// HMAC key for signed download links.
    pub signing_secret: String,
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobConfig")
            .field("backend", &self.backend)
            .field("root", &self.root)
            .field("public_url", &self.public_url)
            .field("signing_secret", &"[REDACTED]")
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .finish()
    }
}

/// A statically configured user.
///
/// Exactly one of `token` or `token_hash` (hex SHA224) must be set.
#[derive(Clone, Serialize, Deserialize)]
pub struct StaticUserConfig {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_hash: Option<String>,
}

impl std::fmt::Debug for StaticUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticUserConfig")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_hash", &self.token_hash)
            .finish()
    }
}

/// Identity provider configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Provider: "static" or "http".
    #[serde(default = "default_identity_provider")]
    pub provider: String,
    /// Users for the static provider.
    #[serde(default)]
    pub users: Vec<StaticUserConfig>,
    /// Base URL of the auth service for the http provider.
    #[serde(default)]
    pub url: Option<String>,
    /// Project key sent alongside user tokens.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_identity_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            provider: default_identity_provider(),
            users: Vec::new(),
            url: None,
            api_key: None,
            timeout_secs: default_identity_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("provider", &self.provider)
            .field("users", &self.users)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Quota and bulk-operation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Lowest tier allowed to run bulk metadata updates.
    #[serde(default = "default_bulk_min_tier")]
    pub bulk_min_tier: String,
    /// Maximum ids accepted in one bulk request.
    #[serde(default = "default_max_bulk_ids")]
    pub max_bulk_ids: usize,
    /// Re-check usage after committing an upload and roll it back if a
    /// concurrent upload pushed the user over the limit.
    #[serde(default = "default_recheck_on_commit")]
    pub recheck_on_commit: bool,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            bulk_min_tier: default_bulk_min_tier(),
            max_bulk_ids: default_max_bulk_ids(),
            recheck_on_commit: default_recheck_on_commit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    /// Prometheus exporter listen address. Disabled when unset.
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"wayfarer_guard": "debug", "sqlx": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
