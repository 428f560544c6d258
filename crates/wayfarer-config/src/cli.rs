//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;
use crate::types::StaticUserConfig;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override HTTP listen address, e.g. 0.0.0.0:8080
    #[arg(long, env = "WAYFARER_LISTEN")]
    pub listen: Option<String>,
    /// Override maximum request body size (bytes)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
    /// Override record store backend (sql, memory)
    #[arg(long)]
    pub store_backend: Option<String>,
    /// Override database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Override blob store backend (fs, memory)
    #[arg(long)]
    pub blob_backend: Option<String>,
    /// Override blob root directory
    #[arg(long)]
    pub blob_root: Option<String>,
    /// Override public base URL of the blob route
    #[arg(long)]
    pub blob_public_url: Option<String>,
    /// Override download link signing secret
    #[arg(long, env = "WAYFARER_SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: Option<String>,
    /// Override download link lifetime (seconds)
    #[arg(long)]
    pub signed_url_ttl_secs: Option<u64>,
    /// Override identity provider (static, http)
    #[arg(long)]
    pub identity_provider: Option<String>,
    /// Override identity service base URL
    #[arg(long, env = "WAYFARER_IDENTITY_URL")]
    pub identity_url: Option<String>,
    /// Override identity service project key
    #[arg(long, env = "WAYFARER_IDENTITY_API_KEY", hide_env_values = true)]
    pub identity_api_key: Option<String>,
    /// Add a static user as ID:TOKEN (repeatable or comma-separated)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub user: Option<Vec<String>>,
    /// Override minimum tier for bulk operations
    #[arg(long)]
    pub bulk_min_tier: Option<String>,
    /// Override maximum ids per bulk request
    #[arg(long)]
    pub max_bulk_ids: Option<usize>,
    /// Re-check quota after committing an upload
    #[arg(long)]
    pub recheck_on_commit: Option<bool>,
    /// Override metrics listen address
    #[arg(long)]
    pub metrics_listen: Option<String>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Override log format (json/pretty/compact)
    #[arg(long)]
    pub log_format: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.listen {
        config.server.listen = v.clone();
    }
    if let Some(v) = overrides.max_upload_bytes {
        config.server.max_upload_bytes = v;
    }
    if let Some(v) = &overrides.store_backend {
        config.store.backend = v.clone();
    }
    if let Some(v) = &overrides.database_url {
        config.store.database_url = Some(v.clone());
    }
    if let Some(v) = &overrides.blob_backend {
        config.blob.backend = v.clone();
    }
    if let Some(v) = &overrides.blob_root {
        config.blob.root = v.clone();
    }
    if let Some(v) = &overrides.blob_public_url {
        config.blob.public_url = v.clone();
    }
    if let Some(v) = &overrides.signing_secret {
        config.blob.signing_secret = v.clone();
    }
    if let Some(v) = overrides.signed_url_ttl_secs {
        config.blob.signed_url_ttl_secs = v;
    }
    if let Some(v) = &overrides.identity_provider {
        config.identity.provider = v.clone();
    }
    if let Some(v) = &overrides.identity_url {
        config.identity.url = Some(v.clone());
    }
    if let Some(v) = &overrides.identity_api_key {
        config.identity.api_key = Some(v.clone());
    }
    // ID:TOKEN pairs; entries without a colon are ignored
    if let Some(users) = &overrides.user {
        for entry in users {
            if let Some((id, token)) = entry.split_once(':') {
                config.identity.users.push(StaticUserConfig {
                    id: id.trim().to_string(),
                    email: None,
                    token: Some(token.to_string()),
                    token_hash: None,
                });
            }
        }
    }
    if let Some(v) = &overrides.bulk_min_tier {
        config.quota.bulk_min_tier = v.clone();
    }
    if let Some(v) = overrides.max_bulk_ids {
        config.quota.max_bulk_ids = v;
    }
    if let Some(v) = overrides.recheck_on_commit {
        config.quota.recheck_on_commit = v;
    }
    if let Some(v) = &overrides.metrics_listen {
        config.metrics.listen = Some(v.clone());
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
    if let Some(v) = &overrides.log_format {
        config.logging.format = Some(v.clone());
    }
}
