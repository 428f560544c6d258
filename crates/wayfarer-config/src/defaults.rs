//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `wayfarer_core::defaults`.

use std::collections::BTreeMap;

use wayfarer_core::defaults;
use wayfarer_guard::{Tier, TierLimits, default_tier_limits};

/// Generate default value functions that forward to wayfarer_core::defaults constants.
macro_rules! default_fns {
    // For Copy types (integers, bool, etc.)
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_max_upload_bytes       => DEFAULT_MAX_UPLOAD_BYTES: usize,
    default_shutdown_timeout_secs  => DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64,
    default_signed_url_ttl_secs    => DEFAULT_SIGNED_URL_TTL_SECS: u64,
    max_signed_url_ttl_secs        => MAX_SIGNED_URL_TTL_SECS: u64,
    min_signing_secret_bytes       => MIN_SIGNING_SECRET_BYTES: usize,
    default_max_bulk_ids           => DEFAULT_MAX_BULK_IDS: usize,
    default_recheck_on_commit      => DEFAULT_RECHECK_ON_COMMIT: bool,
    default_db_max_connections     => DEFAULT_DB_MAX_CONNECTIONS: u32,
    default_db_min_connections     => DEFAULT_DB_MIN_CONNECTIONS: u32,
    default_db_connect_timeout_secs => DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64,
    default_identity_timeout_secs  => DEFAULT_IDENTITY_TIMEOUT_SECS: u64,
}

default_string_fns! {
    default_listen            => DEFAULT_LISTEN,
    default_blob_public_url   => DEFAULT_BLOB_PUBLIC_URL,
    default_bulk_min_tier     => DEFAULT_BULK_MIN_TIER,
    default_store_backend     => DEFAULT_STORE_BACKEND,
    default_identity_provider => DEFAULT_IDENTITY_PROVIDER,
}

pub(crate) fn default_blob_backend() -> String {
    "fs".to_string()
}

pub(crate) fn default_blob_root() -> String {
    "data/blobs".to_string()
}

pub(crate) fn default_init_schema() -> bool {
    true
}

pub(crate) fn default_tiers() -> BTreeMap<Tier, TierLimits> {
    default_tier_limits()
}
