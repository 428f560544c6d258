//! Server state shared across requests.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use wayfarer_config::Config;
use wayfarer_guard::sql::{SqlStore, SqlStoreConfig};
use wayfarer_guard::{
    BlobStore, FsBlobStore, Guard, HttpIdentity, Identity, IdentityProvider, MemoryBlobStore,
    MemoryStore, RecordStore, StaticIdentity, UrlSigner,
};

use crate::error::ServerError;

/// Shared state for all handlers.
///
/// Holds no per-user data; every decision reads the record store fresh.
#[derive(Clone)]
pub struct AppState {
    pub guard: Guard,
    pub identity: Arc<dyn IdentityProvider>,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(guard: Guard, identity: Arc<dyn IdentityProvider>, max_upload_bytes: usize) -> Self {
        Self {
            guard,
            identity,
            max_upload_bytes,
        }
    }

    /// Build stores, identity provider and guard from a validated config.
    pub async fn from_config(config: &Config) -> Result<Self, ServerError> {
        let catalog = Arc::new(config.tier_catalog()?);
        let records = build_record_store(config).await?;
        let blobs = build_blob_store(config).await?;
        let identity = build_identity(config)?;

        let policy = config.guard_policy();
        info!(
            store = %config.store.backend,
            blob = %config.blob.backend,
            identity = %config.identity.provider,
            bulk_min_tier = %policy.bulk_min_tier,
            recheck_on_commit = policy.recheck_on_commit,
            "guard initialized"
        );
        let guard = Guard::new(records, blobs, catalog, policy);
        Ok(Self::new(guard, identity, config.server.max_upload_bytes))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("guard", &self.guard)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}

async fn build_record_store(config: &Config) -> Result<Arc<dyn RecordStore>, ServerError> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sql" => {
            let url = config
                .store
                .database_url
                .as_deref()
                .ok_or_else(|| ServerError::Config("store.database_url is required".into()))?;
            let sql_config = SqlStoreConfig::new(url)
                .max_connections(config.store.max_connections)
                .min_connections(config.store.min_connections)
                .connect_timeout(Duration::from_secs(config.store.connect_timeout_secs))
                .init_schema(config.store.init_schema);
            let store = SqlStore::connect(sql_config).await?;
            info!(database = ?store.database_type(), "record store connected");
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!("unknown store backend '{other}'"))),
    }
}

async fn build_blob_store(config: &Config) -> Result<Arc<dyn BlobStore>, ServerError> {
    let signer = UrlSigner::new(&config.blob.signing_secret, config.blob.public_url.clone())?;
    match config.blob.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBlobStore::new(signer))),
        "fs" => {
            let store = FsBlobStore::open(&config.blob.root, signer).await?;
            info!(root = %store.root().display(), "blob store opened");
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!("unknown blob backend '{other}'"))),
    }
}

fn build_identity(config: &Config) -> Result<Arc<dyn IdentityProvider>, ServerError> {
    let cfg = &config.identity;
    match cfg.provider.as_str() {
        "static" => {
            let mut identity = StaticIdentity::new();
            for user in &cfg.users {
                let mut who = Identity::new(user.id.trim());
                if let Some(email) = &user.email {
                    who = who.with_email(email.clone());
                }
                match (&user.token, &user.token_hash) {
                    (Some(token), _) => identity.add_token(token, who),
                    (None, Some(hash)) => identity.add_hash(hash.clone(), who),
                    (None, None) => {}
                }
            }
            info!(users = identity.len(), "static identity provider loaded");
            Ok(Arc::new(identity))
        }
        "http" => {
            let url = cfg
                .url
                .as_deref()
                .ok_or_else(|| ServerError::Config("identity.url is required".into()))?;
            let identity = HttpIdentity::new(
                url,
                cfg.api_key.clone(),
                Duration::from_secs(cfg.timeout_secs),
            )?;
            Ok(Arc::new(identity))
        }
        other => Err(ServerError::Config(format!(
            "unknown identity provider '{other}'"
        ))),
    }
}
