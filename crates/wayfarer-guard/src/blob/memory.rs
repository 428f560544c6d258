//! In-memory blob store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::{UrlSigner, validate_blob_path};
use crate::error::GuardError;
use crate::traits::{BlobStore, SignedLink};

/// Blob store that keeps objects in a map.
#[derive(Debug)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Bytes>>,
    signer: UrlSigner,
}

impl MemoryBlobStore {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            signer,
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Whether an object exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.objects.read().contains_key(path)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<(), GuardError> {
        validate_blob_path(path)?;
        self.objects.write().insert(path.to_string(), data);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, GuardError> {
        validate_blob_path(path)?;
        Ok(self.objects.read().get(path).cloned())
    }

    async fn delete(&self, path: &str) -> Result<bool, GuardError> {
        validate_blob_path(path)?;
        Ok(self.objects.write().remove(path).is_some())
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<SignedLink, GuardError> {
        validate_blob_path(path)?;
        Ok(self.signer.sign(path, ttl))
    }

    fn verify_signed(&self, path: &str, expires_at: i64, signature: &str) -> bool {
        validate_blob_path(path).is_ok() && self.signer.verify(path, expires_at, signature)
    }
}
