//! Configuration loading, CLI overrides and validation for wayfarer.
//!
//! Config files may be JSON (with comments), YAML or TOML; the format is
//! chosen by extension. Command-line flags and a few environment variables
//! are applied on top with [`apply_overrides`].

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wayfarer_guard::{GuardError, GuardPolicy, Tier, TierCatalog, TierLimits};

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::*;
pub use validate::validate_config;

use crate::defaults::default_tiers;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub blob: BlobConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Per-tier limits. Missing tiers are a validation error.
    #[serde(default = "default_tiers")]
    pub tiers: BTreeMap<Tier, TierLimits>,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Build the immutable tier catalog from the `tiers` section.
    pub fn tier_catalog(&self) -> Result<TierCatalog, GuardError> {
        TierCatalog::from_limits(self.tiers.clone())
    }

    /// Guard policy derived from the `quota` and `blob` sections.
    ///
    /// Call after [`validate_config`]; an unknown `bulk_min_tier` falls back
    /// to the most restrictive paid tier.
    pub fn guard_policy(&self) -> GuardPolicy {
        GuardPolicy {
            signed_url_ttl: Duration::from_secs(self.blob.signed_url_ttl_secs),
            bulk_min_tier: Tier::parse(&self.quota.bulk_min_tier).unwrap_or(Tier::Enterprise),
            max_bulk_ids: self.quota.max_bulk_ids,
            recheck_on_commit: self.quota.recheck_on_commit,
        }
    }
}
