//! # wayfarer-rs
//!
//! Storage quota, ownership and subscription-tier guard for the wayfarer
//! travel dashboard.
//!
//! ## Crates
//!
//! - [`wayfarer_core`] - Shared defaults and error type labels
//! - [`wayfarer_guard`] - Tier catalog, quota evaluation, ownership checks and stores
//! - [`wayfarer_config`] - Configuration loading and validation
//! - [`wayfarer_metrics`] - Prometheus-compatible metrics
//! - [`wayfarer_server`] - HTTP surface

pub use wayfarer_config as config;
pub use wayfarer_core as core;
pub use wayfarer_guard as guard;
pub use wayfarer_metrics as metrics;
pub use wayfarer_server as server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use wayfarer_config::{Config, load_config, validate_config};
    pub use wayfarer_guard::{
        BlobStore, Guard, GuardError, GuardPolicy, IdentityProvider, RecordStore, Tier,
        TierCatalog,
    };
    pub use wayfarer_server::{CancellationToken, ServerError, run, run_with_shutdown};
}
