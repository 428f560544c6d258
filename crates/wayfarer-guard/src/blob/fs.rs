//! Filesystem blob store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{UrlSigner, validate_blob_path};
use crate::error::GuardError;
use crate::traits::{BlobStore, SignedLink};

/// Blob store that writes each object to `{root}/{path}`.
///
/// Writes go to a temporary sibling first and are renamed into place.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    signer: UrlSigner,
}

impl FsBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>, signer: UrlSigner) -> Result<Self, GuardError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, signer })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, GuardError> {
        validate_blob_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<(), GuardError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = target.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(path, bytes = data.len(), "blob stored");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, GuardError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<bool, GuardError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<SignedLink, GuardError> {
        validate_blob_path(path)?;
        Ok(self.signer.sign(path, ttl))
    }

    fn verify_signed(&self, path: &str, expires_at: i64, signature: &str) -> bool {
        validate_blob_path(path).is_ok() && self.signer.verify(path, expires_at, signature)
    }
}
