//! Configuration validation logic.

use std::net::SocketAddr;

use wayfarer_guard::{Tier, TierCatalog, is_token_hash};

use crate::Config;
use crate::defaults::{max_signed_url_ttl_secs, min_signing_secret_bytes};
use crate::loader::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.listen.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "server.listen is not a socket address: {:?}",
            config.server.listen
        )));
    }
    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::Validation(
            "server.max_upload_bytes must be > 0".into(),
        ));
    }

    match config.store.backend.as_str() {
        "sql" => {
            let url = config.store.database_url.as_deref().unwrap_or("");
            if url.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "store.database_url is required for the sql backend".into(),
                ));
            }
            if config.store.max_connections == 0 {
                return Err(ConfigError::Validation(
                    "store.max_connections must be > 0".into(),
                ));
            }
            if config.store.min_connections > config.store.max_connections {
                return Err(ConfigError::Validation(
                    "store.min_connections must be <= max_connections".into(),
                ));
            }
        }
        "memory" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "store.backend must be 'sql' or 'memory', got '{other}'"
            )));
        }
    }

    match config.blob.backend.as_str() {
        "fs" => {
            if config.blob.root.trim().is_empty() {
                return Err(ConfigError::Validation("blob.root is empty".into()));
            }
        }
        "memory" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "blob.backend must be 'fs' or 'memory', got '{other}'"
            )));
        }
    }
    if config.blob.signing_secret.len() < min_signing_secret_bytes() {
        return Err(ConfigError::Validation(format!(
            "blob.signing_secret must be at least {} bytes",
            min_signing_secret_bytes()
        )));
    }
    if config.blob.signed_url_ttl_secs == 0
        || config.blob.signed_url_ttl_secs > max_signed_url_ttl_secs()
    {
        return Err(ConfigError::Validation(format!(
            "blob.signed_url_ttl_secs must be 1..={}",
            max_signed_url_ttl_secs()
        )));
    }
    if config.blob.public_url.trim().is_empty() {
        return Err(ConfigError::Validation("blob.public_url is empty".into()));
    }

    match config.identity.provider.as_str() {
        "static" => {
            if config.identity.users.is_empty() {
                return Err(ConfigError::Validation(
                    "identity.users must be non-empty for the static provider".into(),
                ));
            }
            for user in &config.identity.users {
                if user.id.trim().is_empty() {
                    return Err(ConfigError::Validation("identity.users: empty id".into()));
                }
                match (&user.token, &user.token_hash) {
                    (Some(t), None) if !t.is_empty() => {}
                    (None, Some(h)) if is_token_hash(h) => {}
                    (None, Some(_)) => {
                        return Err(ConfigError::Validation(format!(
                            "identity.users '{}': token_hash must be 56 hex chars",
                            user.id
                        )));
                    }
                    _ => {
                        return Err(ConfigError::Validation(format!(
                            "identity.users '{}': set exactly one of token or token_hash",
                            user.id
                        )));
                    }
                }
            }
        }
        "http" => {
            let url = config.identity.url.as_deref().unwrap_or("");
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(
                    "identity.url must be an http(s) URL for the http provider".into(),
                ));
            }
            if config.identity.timeout_secs == 0 {
                return Err(ConfigError::Validation(
                    "identity.timeout_secs must be > 0".into(),
                ));
            }
        }
        other => {
            return Err(ConfigError::Validation(format!(
                "identity.provider must be 'static' or 'http', got '{other}'"
            )));
        }
    }

    TierCatalog::from_limits(config.tiers.clone())
        .map_err(|e| ConfigError::Validation(e.to_string()))?;

    if Tier::parse(&config.quota.bulk_min_tier).is_none() {
        return Err(ConfigError::Validation(format!(
            "quota.bulk_min_tier is not a known tier: {:?}",
            config.quota.bulk_min_tier
        )));
    }
    if config.quota.max_bulk_ids == 0 {
        return Err(ConfigError::Validation(
            "quota.max_bulk_ids must be > 0".into(),
        ));
    }

    if let Some(listen) = &config.metrics.listen
        && listen.parse::<SocketAddr>().is_err()
    {
        return Err(ConfigError::Validation(format!(
            "metrics.listen is not a socket address: {listen:?}"
        )));
    }
    if let Some(format) = &config.logging.format
        && !["json", "pretty", "compact"].contains(&format.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.format must be json, pretty or compact, got '{format}'"
        )));
    }
    if let Some(output) = &config.logging.output
        && !["stdout", "stderr"].contains(&output.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.output must be stdout or stderr, got '{output}'"
        )));
    }

    Ok(())
}
