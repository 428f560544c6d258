//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::GuardError;
use crate::model::{ExperienceRecord, ImageRecord, Metadata, UserProfile, now_unix};
use crate::quota::{UsageCommit, apply_delta};
use crate::traits::RecordStore;

/// Record store backed by in-process maps.
///
/// Suitable for tests and single-node demos. Every mutation happens under one
/// write lock, so usage deltas accumulate the same way the SQL store's
/// relative `UPDATE` does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<String, UserProfile>,
    images: HashMap<String, ImageRecord>,
    experiences: HashMap<String, ExperienceRecord>,
}

impl MemoryStore {
    /// Create an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile, replacing any existing one with the same id.
    pub fn put_profile(&self, profile: UserProfile) {
        self.inner.write().profiles.insert(profile.id.clone(), profile);
    }

    /// Seed an image record.
    pub fn put_image(&self, image: ImageRecord) {
        self.inner.write().images.insert(image.id.clone(), image);
    }

    /// Seed an experience record.
    pub fn put_experience(&self, experience: ExperienceRecord) {
        self.inner
            .write()
            .experiences
            .insert(experience.id.clone(), experience);
    }

    /// Read an image regardless of owner (test inspection).
    pub fn image(&self, image_id: &str) -> Option<ImageRecord> {
        self.inner.read().images.get(image_id).cloned()
    }

    /// Read a profile's current usage (test inspection).
    pub fn storage_used(&self, user_id: &str) -> Option<u64> {
        self.inner
            .read()
            .profiles
            .get(user_id)
            .map(|p| p.storage_used_bytes)
    }
}

fn sorted_images(mut images: Vec<ImageRecord>) -> Vec<ImageRecord> {
    images.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    images
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, GuardError> {
        Ok(self.inner.read().profiles.get(user_id).cloned())
    }

    async fn insert_profile_if_absent(&self, profile: &UserProfile) -> Result<bool, GuardError> {
        let mut tables = self.inner.write();
        if tables.profiles.contains_key(&profile.id) {
            return Ok(false);
        }
        tables.profiles.insert(profile.id.clone(), profile.clone());
        Ok(true)
    }

    async fn set_subscription_tier(&self, user_id: &str, tier: &str) -> Result<bool, GuardError> {
        let mut tables = self.inner.write();
        match tables.profiles.get_mut(user_id) {
            Some(p) => {
                p.subscription_tier = tier.to_string();
                p.updated_at = now_unix();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_storage_used(
        &self,
        user_id: &str,
        delta_bytes: i64,
    ) -> Result<Option<UsageCommit>, GuardError> {
        let mut tables = self.inner.write();
        Ok(tables.profiles.get_mut(user_id).map(|p| {
            let commit = apply_delta(p.storage_used_bytes, delta_bytes);
            p.storage_used_bytes = commit.used_bytes;
            p.updated_at = now_unix();
            commit
        }))
    }

    async fn get_image(
        &self,
        owner_id: &str,
        image_id: &str,
    ) -> Result<Option<ImageRecord>, GuardError> {
        Ok(self
            .inner
            .read()
            .images
            .get(image_id)
            .filter(|i| i.owner_id == owner_id)
            .cloned())
    }

    async fn find_image_by_path(
        &self,
        owner_id: &str,
        storage_path: &str,
    ) -> Result<Option<ImageRecord>, GuardError> {
        Ok(self
            .inner
            .read()
            .images
            .values()
            .find(|i| i.owner_id == owner_id && i.storage_path == storage_path)
            .cloned())
    }

    async fn list_images(&self, owner_id: &str) -> Result<Vec<ImageRecord>, GuardError> {
        let images = self
            .inner
            .read()
            .images
            .values()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(sorted_images(images))
    }

    async fn count_owned_images(
        &self,
        owner_id: &str,
        image_ids: &[String],
    ) -> Result<u64, GuardError> {
        let tables = self.inner.read();
        let n = image_ids
            .iter()
            .filter(|id| {
                tables
                    .images
                    .get(id.as_str())
                    .is_some_and(|i| i.owner_id == owner_id)
            })
            .count();
        Ok(n as u64)
    }

    async fn insert_image(&self, image: &ImageRecord) -> Result<(), GuardError> {
        let mut tables = self.inner.write();
        if tables.images.contains_key(&image.id)
            || tables
                .images
                .values()
                .any(|i| i.storage_path == image.storage_path)
        {
            return Err(GuardError::upstream("duplicate image id or storage path"));
        }
        tables.images.insert(image.id.clone(), image.clone());
        Ok(())
    }

    async fn update_image_metadata(
        &self,
        owner_id: &str,
        image_ids: &[String],
        metadata: &Metadata,
        now: i64,
    ) -> Result<Vec<ImageRecord>, GuardError> {
        let mut tables = self.inner.write();
        let mut updated = Vec::new();
        for id in image_ids {
            if let Some(image) = tables.images.get_mut(id.as_str())
                && image.owner_id == owner_id
            {
                image.metadata = metadata.clone();
                image.updated_at = now;
                updated.push(image.clone());
            }
        }
        Ok(updated)
    }

    async fn set_image_experience(
        &self,
        owner_id: &str,
        image_id: &str,
        experience_id: Option<&str>,
        now: i64,
    ) -> Result<Option<ImageRecord>, GuardError> {
        let mut tables = self.inner.write();
        Ok(tables
            .images
            .get_mut(image_id)
            .filter(|i| i.owner_id == owner_id)
            .map(|image| {
                image.experience_id = experience_id.map(str::to_string);
                image.updated_at = now;
                image.clone()
            }))
    }

    async fn delete_image(
        &self,
        owner_id: &str,
        image_id: &str,
    ) -> Result<Option<ImageRecord>, GuardError> {
        let mut tables = self.inner.write();
        let owned = tables
            .images
            .get(image_id)
            .is_some_and(|i| i.owner_id == owner_id);
        Ok(if owned {
            tables.images.remove(image_id)
        } else {
            None
        })
    }

    async fn get_experience(
        &self,
        owner_id: &str,
        experience_id: &str,
    ) -> Result<Option<ExperienceRecord>, GuardError> {
        Ok(self
            .inner
            .read()
            .experiences
            .get(experience_id)
            .filter(|e| e.owner_id == owner_id)
            .cloned())
    }

    async fn list_experiences(&self, owner_id: &str) -> Result<Vec<ExperienceRecord>, GuardError> {
        let mut list: Vec<ExperienceRecord> = self
            .inner
            .read()
            .experiences
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn count_experiences(&self, owner_id: &str) -> Result<u64, GuardError> {
        let n = self
            .inner
            .read()
            .experiences
            .values()
            .filter(|e| e.owner_id == owner_id)
            .count();
        Ok(n as u64)
    }

    async fn insert_experience(&self, experience: &ExperienceRecord) -> Result<(), GuardError> {
        let mut tables = self.inner.write();
        if tables.experiences.contains_key(&experience.id) {
            return Err(GuardError::upstream("duplicate experience id"));
        }
        tables
            .experiences
            .insert(experience.id.clone(), experience.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tier::Tier;

    #[tokio::test]
    async fn test_add_storage_used_accumulates_concurrently() {
        let store = Arc::new(MemoryStore::new());
        store.put_profile(UserProfile::new("u1", Tier::Free));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add_storage_used("u1", 1_000).await.unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.storage_used("u1"), Some(32_000));
    }

    #[tokio::test]
    async fn test_add_storage_used_clamps() {
        let store = MemoryStore::new();
        store.put_profile(UserProfile::new("u1", Tier::Free).with_storage_used(100));

        let commit = store.add_storage_used("u1", -250).await.unwrap().unwrap();
        assert_eq!(commit.used_bytes, 0);
        assert_eq!(commit.clamped_bytes, 150);
        assert_eq!(store.storage_used("u1"), Some(0));
    }

    #[tokio::test]
    async fn test_add_storage_used_unknown_user() {
        let store = MemoryStore::new();
        assert!(store.add_storage_used("ghost", 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_profile_if_absent_keeps_existing() {
        let store = MemoryStore::new();
        store.put_profile(UserProfile::new("u1", Tier::Traveler).with_storage_used(7));

        let created = store
            .insert_profile_if_absent(&UserProfile::new("u1", Tier::Free))
            .await
            .unwrap();
        assert!(!created);
        let p = store.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(p.subscription_tier, "traveler");
        assert_eq!(p.storage_used_bytes, 7);
    }
}
