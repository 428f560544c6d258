//! Collaborator traits: record store, blob store, identity provider.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::GuardError;
use crate::model::{ExperienceRecord, Identity, ImageRecord, Metadata, UserProfile};
use crate::quota::UsageCommit;

/// Data-access layer for profiles, images and experiences.
///
/// Every method that touches a user-owned table takes the owner id and must
/// filter on it. Return `Ok(None)` (or an empty result) when nothing matches;
/// the guard decides what that means for the caller.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are called
/// concurrently from independent requests.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a profile by user id.
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, GuardError>;

    /// Insert a profile unless one already exists for the id.
    ///
    /// Returns `true` if a row was created.
    async fn insert_profile_if_absent(&self, profile: &UserProfile) -> Result<bool, GuardError>;

    /// Change a user's subscription tier. Returns `false` if the user is unknown.
    async fn set_subscription_tier(&self, user_id: &str, tier: &str) -> Result<bool, GuardError>;

    /// Apply a relative change to `storage_used_bytes` in one atomic step.
    ///
    /// The stored value becomes `max(0, used + delta_bytes)`. Concurrent calls
    /// must accumulate. Returns `None` if the user is unknown.
    async fn add_storage_used(
        &self,
        user_id: &str,
        delta_bytes: i64,
    ) -> Result<Option<UsageCommit>, GuardError>;

    /// Fetch an image by id, restricted to `owner_id`.
    async fn get_image(
        &self,
        owner_id: &str,
        image_id: &str,
    ) -> Result<Option<ImageRecord>, GuardError>;

    /// Fetch an image by exact storage path, restricted to `owner_id`.
    async fn find_image_by_path(
        &self,
        owner_id: &str,
        storage_path: &str,
    ) -> Result<Option<ImageRecord>, GuardError>;

    /// List an owner's images, newest first.
    async fn list_images(&self, owner_id: &str) -> Result<Vec<ImageRecord>, GuardError>;

    /// Count how many of `image_ids` exist and belong to `owner_id`.
    async fn count_owned_images(
        &self,
        owner_id: &str,
        image_ids: &[String],
    ) -> Result<u64, GuardError>;

    /// Insert a new image record.
    async fn insert_image(&self, image: &ImageRecord) -> Result<(), GuardError>;

    /// Replace metadata on every listed image owned by `owner_id`.
    ///
    /// Returns the updated records.
    async fn update_image_metadata(
        &self,
        owner_id: &str,
        image_ids: &[String],
        metadata: &Metadata,
        now: i64,
    ) -> Result<Vec<ImageRecord>, GuardError>;

    /// Set or clear an image's experience.
    async fn set_image_experience(
        &self,
        owner_id: &str,
        image_id: &str,
        experience_id: Option<&str>,
        now: i64,
    ) -> Result<Option<ImageRecord>, GuardError>;

    /// Delete an image record, returning it if it existed.
    async fn delete_image(
        &self,
        owner_id: &str,
        image_id: &str,
    ) -> Result<Option<ImageRecord>, GuardError>;

    /// Fetch an experience by id, restricted to `owner_id`.
    async fn get_experience(
        &self,
        owner_id: &str,
        experience_id: &str,
    ) -> Result<Option<ExperienceRecord>, GuardError>;

    /// List an owner's experiences, oldest first.
    async fn list_experiences(&self, owner_id: &str) -> Result<Vec<ExperienceRecord>, GuardError>;

    /// Count an owner's experiences.
    async fn count_experiences(&self, owner_id: &str) -> Result<u64, GuardError>;

    /// Insert a new experience record.
    async fn insert_experience(&self, experience: &ExperienceRecord) -> Result<(), GuardError>;
}

/// A time-limited retrieval link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedLink {
    pub url: String,
    /// Unix timestamp after which the link is rejected.
    pub expires_at: i64,
}

/// Binary object storage keyed by string paths.
///
/// The blob store does not enforce per-user access; callers check ownership
/// before issuing a link.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object, replacing any existing object at `path`.
    async fn put(&self, path: &str, data: Bytes) -> Result<(), GuardError>;

    /// Read an object. `None` if absent.
    async fn get(&self, path: &str) -> Result<Option<Bytes>, GuardError>;

    /// Remove an object. Returns `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, GuardError>;

    /// Issue a link that grants read access to `path` for `ttl`.
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<SignedLink, GuardError>;

    /// Check a link's signature and expiry.
    fn verify_signed(&self, path: &str, expires_at: i64, signature: &str) -> bool;
}

/// Resolves a request credential to a user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token.
    ///
    /// # Returns
    /// * `Ok(Some(identity))` - token is valid
    /// * `Ok(None)` - token is unknown, expired or revoked
    /// * `Err(GuardError)` - the provider could not be reached
    async fn current_user(&self, token: &str) -> Result<Option<Identity>, GuardError>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, GuardError> {
        (**self).get_profile(user_id).await
    }

    async fn insert_profile_if_absent(&self, profile: &UserProfile) -> Result<bool, GuardError> {
        (**self).insert_profile_if_absent(profile).await
    }

    async fn set_subscription_tier(&self, user_id: &str, tier: &str) -> Result<bool, GuardError> {
        (**self).set_subscription_tier(user_id, tier).await
    }

    async fn add_storage_used(
        &self,
        user_id: &str,
        delta_bytes: i64,
    ) -> Result<Option<UsageCommit>, GuardError> {
        (**self).add_storage_used(user_id, delta_bytes).await
    }

    async fn get_image(
        &self,
        owner_id: &str,
        image_id: &str,
    ) -> Result<Option<ImageRecord>, GuardError> {
        (**self).get_image(owner_id, image_id).await
    }

    async fn find_image_by_path(
        &self,
        owner_id: &str,
        storage_path: &str,
    ) -> Result<Option<ImageRecord>, GuardError> {
        (**self).find_image_by_path(owner_id, storage_path).await
    }

    async fn list_images(&self, owner_id: &str) -> Result<Vec<ImageRecord>, GuardError> {
        (**self).list_images(owner_id).await
    }

    async fn count_owned_images(
        &self,
        owner_id: &str,
        image_ids: &[String],
    ) -> Result<u64, GuardError> {
        (**self).count_owned_images(owner_id, image_ids).await
    }

    async fn insert_image(&self, image: &ImageRecord) -> Result<(), GuardError> {
        (**self).insert_image(image).await
    }

    async fn update_image_metadata(
        &self,
        owner_id: &str,
        image_ids: &[String],
        metadata: &Metadata,
        now: i64,
    ) -> Result<Vec<ImageRecord>, GuardError> {
        (**self)
            .update_image_metadata(owner_id, image_ids, metadata, now)
            .await
    }

    async fn set_image_experience(
        &self,
        owner_id: &str,
        image_id: &str,
        experience_id: Option<&str>,
        now: i64,
    ) -> Result<Option<ImageRecord>, GuardError> {
        (**self)
            .set_image_experience(owner_id, image_id, experience_id, now)
            .await
    }

    async fn delete_image(
        &self,
        owner_id: &str,
        image_id: &str,
    ) -> Result<Option<ImageRecord>, GuardError> {
        (**self).delete_image(owner_id, image_id).await
    }

    async fn get_experience(
        &self,
        owner_id: &str,
        experience_id: &str,
    ) -> Result<Option<ExperienceRecord>, GuardError> {
        (**self).get_experience(owner_id, experience_id).await
    }

    async fn list_experiences(&self, owner_id: &str) -> Result<Vec<ExperienceRecord>, GuardError> {
        (**self).list_experiences(owner_id).await
    }

    async fn count_experiences(&self, owner_id: &str) -> Result<u64, GuardError> {
        (**self).count_experiences(owner_id).await
    }

    async fn insert_experience(&self, experience: &ExperienceRecord) -> Result<(), GuardError> {
        (**self).insert_experience(experience).await
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    async fn put(&self, path: &str, data: Bytes) -> Result<(), GuardError> {
        (**self).put(path, data).await
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, GuardError> {
        (**self).get(path).await
    }

    async fn delete(&self, path: &str) -> Result<bool, GuardError> {
        (**self).delete(path).await
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<SignedLink, GuardError> {
        (**self).create_signed_url(path, ttl).await
    }

    fn verify_signed(&self, path: &str, expires_at: i64, signature: &str) -> bool {
        (**self).verify_signed(path, expires_at, signature)
    }
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    async fn current_user(&self, token: &str) -> Result<Option<Identity>, GuardError> {
        (**self).current_user(token).await
    }
}
