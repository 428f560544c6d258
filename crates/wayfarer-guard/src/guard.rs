//! Access and quota guard.
//!
//! [`Guard`] sits between request handlers and the record/blob stores. It
//! decides whether an operation may proceed (tier gate, ownership, quota) and
//! keeps `storage_used_bytes` in step with the bytes actually stored.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use wayfarer_core::{
    DEFAULT_BULK_MIN_TIER, DEFAULT_MAX_BULK_IDS, DEFAULT_RECHECK_ON_COMMIT,
    DEFAULT_SIGNED_URL_TTL_SECS,
};

use crate::blob::object_path;
use crate::error::GuardError;
use crate::model::{ExperienceRecord, Identity, ImageRecord, Metadata, UserProfile, now_unix};
use crate::ownership::{
    ExperienceTarget, authorize_experience_access, authorize_image_access, normalize_ids,
};
use crate::quota::{QuotaSnapshot, UploadDecision, UsageCommit, evaluate_upload};
use crate::tier::{Tier, TierCatalog};
use crate::traits::{BlobStore, RecordStore, SignedLink};

/// Maximum experience title length, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Tunables applied by the guard.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    /// Lifetime of issued download links.
    pub signed_url_ttl: Duration,
    /// Lowest tier allowed to use bulk operations.
    pub bulk_min_tier: Tier,
    /// Upper bound on ids in one bulk request.
    pub max_bulk_ids: usize,
    /// Re-read usage after an upload commit and roll the upload back if the
    /// limit was overshot by a concurrent request.
    pub recheck_on_commit: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            signed_url_ttl: Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS),
            bulk_min_tier: Tier::parse(DEFAULT_BULK_MIN_TIER).unwrap_or(Tier::Traveler),
            max_bulk_ids: DEFAULT_MAX_BULK_IDS,
            recheck_on_commit: DEFAULT_RECHECK_ON_COMMIT,
        }
    }
}

/// An authorized move: the owned image and where it may go.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub image: ImageRecord,
    pub target: ExperienceTarget,
}

/// Upload input.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Original file name; only the extension is kept.
    pub filename: Option<String>,
    /// Experience to attach to. `None`, blank or `"unassigned"` leaves the
    /// image unassigned.
    pub experience_id: Option<String>,
    pub data: Bytes,
}

/// Result of a successful upload or delete.
#[derive(Debug, Clone, Serialize)]
pub struct StorageChange {
    pub image: ImageRecord,
    pub commit: UsageCommit,
    pub quota: QuotaSnapshot,
}

/// Access and quota guard.
///
/// Holds no mutable state; every decision reads the record store fresh.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wayfarer_guard::{Guard, GuardPolicy, MemoryBlobStore, MemoryStore, TierCatalog, UrlSigner};
///
/// let signer = UrlSigner::new("0123456789abcdef", "http://localhost:8080/blobs").unwrap();
/// let guard = Guard::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryBlobStore::new(signer)),
///     Arc::new(TierCatalog::default()),
///     GuardPolicy::default(),
/// );
/// assert_eq!(guard.policy().signed_url_ttl.as_secs(), 60);
/// ```
#[derive(Clone)]
pub struct Guard {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<TierCatalog>,
    policy: GuardPolicy,
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("catalog", &self.catalog)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Guard {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<TierCatalog>,
        policy: GuardPolicy,
    ) -> Self {
        Self {
            records,
            blobs,
            catalog,
            policy,
        }
    }

    #[inline]
    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    #[inline]
    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    #[inline]
    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    #[inline]
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    // ── Profiles and quota ──

    /// Load the caller's profile, creating a free-tier one on first sight.
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<UserProfile, GuardError> {
        if let Some(profile) = self.records.get_profile(&identity.id).await? {
            return Ok(profile);
        }

        let fresh =
            UserProfile::new(identity.id.clone(), Tier::Free).with_email(identity.email.clone());
        if self.records.insert_profile_if_absent(&fresh).await? {
            info!(user_id = %identity.id, "profile provisioned");
        }
        self.records
            .get_profile(&identity.id)
            .await?
            .ok_or_else(|| GuardError::Upstream("profile vanished after insert".into()))
    }

    /// Load a profile or fail with [`GuardError::NotFoundOrForbidden`].
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, GuardError> {
        self.records
            .get_profile(user_id)
            .await?
            .ok_or(GuardError::NotFoundOrForbidden)
    }

    /// Current usage against the caller's limit.
    pub async fn quota_status(&self, user_id: &str) -> Result<QuotaSnapshot, GuardError> {
        let profile = self.profile(user_id).await?;
        Ok(QuotaSnapshot::for_profile(&self.catalog, &profile))
    }

    /// Evaluate an upload of `size_bytes` without changing anything.
    pub async fn check_upload(
        &self,
        user_id: &str,
        size_bytes: u64,
    ) -> Result<UploadDecision, GuardError> {
        let profile = self.profile(user_id).await?;
        let decision = evaluate_upload(&self.catalog, &profile, size_bytes);
        if !decision.allowed {
            debug!(
                user_id,
                size_bytes,
                used = decision.quota.used_bytes,
                limit = decision.quota.limit_bytes,
                "upload denied"
            );
        }
        Ok(decision)
    }

    /// Apply a signed change to the caller's recorded usage.
    ///
    /// Called only after the blob and record writes it accounts for have
    /// succeeded. The store applies the delta atomically and clamps at zero.
    pub async fn commit_usage_delta(
        &self,
        user_id: &str,
        delta_bytes: i64,
    ) -> Result<UsageCommit, GuardError> {
        let commit = self
            .records
            .add_storage_used(user_id, delta_bytes)
            .await?
            .ok_or(GuardError::NotFoundOrForbidden)?;
        if commit.clamped() {
            warn!(
                user_id,
                delta_bytes,
                clamped_bytes = commit.clamped_bytes,
                "storage usage clamped at zero, accounting drift"
            );
        }
        Ok(commit)
    }

    // ── Ownership ──

    /// Fetch an image the caller owns.
    pub async fn owned_image(
        &self,
        user_id: &str,
        image_id: &str,
    ) -> Result<ImageRecord, GuardError> {
        match self.records.get_image(user_id, image_id).await? {
            Some(image) if authorize_image_access(user_id, &image) => Ok(image),
            _ => Err(GuardError::NotFoundOrForbidden),
        }
    }

    async fn owned_experience(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<ExperienceRecord, GuardError> {
        match self.records.get_experience(user_id, experience_id).await? {
            Some(exp) if authorize_experience_access(user_id, &exp) => Ok(exp),
            _ => Err(GuardError::NotFoundOrForbidden),
        }
    }

    /// Authorize moving `image_id` to `target`.
    ///
    /// `"unassigned"` is always allowed for the image's owner. Any other
    /// target must be an experience the caller owns.
    pub async fn authorize_experience_assignment(
        &self,
        user_id: &str,
        image_id: &str,
        target: Option<&str>,
    ) -> Result<Assignment, GuardError> {
        let target = ExperienceTarget::parse(target)?;
        let image = self.owned_image(user_id, image_id).await?;
        if let ExperienceTarget::Experience(ref id) = target {
            self.owned_experience(user_id, id).await?;
        }
        Ok(Assignment { image, target })
    }

    /// Check that every id in a bulk request belongs to the caller.
    ///
    /// Returns the normalized id list. Any missing or foreign id rejects the
    /// whole batch.
    pub async fn authorize_bulk<S: AsRef<str>>(
        &self,
        user_id: &str,
        image_ids: &[S],
    ) -> Result<Vec<String>, GuardError> {
        let ids = normalize_ids(image_ids);
        if ids.is_empty() {
            return Err(GuardError::validation("image_ids must not be empty"));
        }
        if ids.len() > self.policy.max_bulk_ids {
            return Err(GuardError::validation(format!(
                "at most {} image_ids per request",
                self.policy.max_bulk_ids
            )));
        }

        let owned = self.records.count_owned_images(user_id, &ids).await?;
        if owned != ids.len() as u64 {
            debug!(user_id, requested = ids.len(), owned, "bulk request rejected");
            return Err(GuardError::NotFoundOrForbidden);
        }
        Ok(ids)
    }

    /// Fail with [`GuardError::Forbidden`] unless the caller's tier covers
    /// `required`.
    pub async fn require_tier(
        &self,
        user_id: &str,
        required: Tier,
    ) -> Result<UserProfile, GuardError> {
        let profile = self.profile(user_id).await?;
        if !crate::tier::meets_requirement(&profile.subscription_tier, required.as_str()) {
            debug!(user_id, tier = %profile.subscription_tier, %required, "tier gate");
            return Err(GuardError::Forbidden { required });
        }
        Ok(profile)
    }

    // ── Image operations ──

    /// List the caller's images, newest first.
    pub async fn list_images(&self, user_id: &str) -> Result<Vec<ImageRecord>, GuardError> {
        self.records.list_images(user_id).await
    }

    /// Replace one image's metadata.
    pub async fn update_metadata(
        &self,
        user_id: &str,
        image_id: &str,
        metadata: Metadata,
    ) -> Result<ImageRecord, GuardError> {
        let ids = [image_id.to_string()];
        let mut updated = self
            .records
            .update_image_metadata(user_id, &ids, &metadata, now_unix())
            .await?;
        updated.pop().ok_or(GuardError::NotFoundOrForbidden)
    }

    /// Replace metadata on many images at once.
    ///
    /// Checks run in order: tier gate, id list validation, ownership of every
    /// id. Nothing is written unless all pass.
    pub async fn bulk_update_metadata<S: AsRef<str>>(
        &self,
        user_id: &str,
        image_ids: &[S],
        metadata: Metadata,
    ) -> Result<Vec<ImageRecord>, GuardError> {
        self.require_tier(user_id, self.policy.bulk_min_tier).await?;
        let ids = self.authorize_bulk(user_id, image_ids).await?;
        let updated = self
            .records
            .update_image_metadata(user_id, &ids, &metadata, now_unix())
            .await?;
        info!(user_id, count = updated.len(), "bulk metadata update");
        Ok(updated)
    }

    /// Move an image to an experience, or clear its experience.
    pub async fn move_image(
        &self,
        user_id: &str,
        image_id: &str,
        target: Option<&str>,
    ) -> Result<ImageRecord, GuardError> {
        let assignment = self
            .authorize_experience_assignment(user_id, image_id, target)
            .await?;
        self.records
            .set_image_experience(
                user_id,
                &assignment.image.id,
                assignment.target.experience_id(),
                now_unix(),
            )
            .await?
            .ok_or(GuardError::NotFoundOrForbidden)
    }

    /// Issue a short-lived link to an image the caller owns.
    ///
    /// `storage_path` must match the record exactly.
    pub async fn issue_download_link(
        &self,
        user_id: &str,
        storage_path: &str,
    ) -> Result<SignedLink, GuardError> {
        if storage_path.trim().is_empty() {
            return Err(GuardError::validation("path is required"));
        }
        let image = self
            .records
            .find_image_by_path(user_id, storage_path)
            .await?
            .filter(|img| authorize_image_access(user_id, img))
            .ok_or(GuardError::NotFoundOrForbidden)?;

        self.blobs
            .create_signed_url(&image.storage_path, self.policy.signed_url_ttl)
            .await
            .map_err(|e| match e {
                GuardError::Upstream(_) => e,
                other => GuardError::upstream(other),
            })
    }

    /// Read a blob through a signed link.
    pub async fn open_signed_blob(
        &self,
        path: &str,
        expires_at: i64,
        signature: &str,
    ) -> Result<Bytes, GuardError> {
        if !self.blobs.verify_signed(path, expires_at, signature) {
            return Err(GuardError::NotFoundOrForbidden);
        }
        self.blobs.get(path).await?.ok_or(GuardError::NotFoundOrForbidden)
    }

    /// Store a new image and account for its size.
    ///
    /// Order: evaluate quota, write blob, insert record, commit usage. If the
    /// record insert fails the blob is removed. With
    /// [`GuardPolicy::recheck_on_commit`] an upload that pushed usage over the
    /// limit is rolled back and reported as [`GuardError::QuotaExceeded`].
    pub async fn upload_image(
        &self,
        user_id: &str,
        request: UploadRequest,
    ) -> Result<StorageChange, GuardError> {
        let size = request.data.len() as u64;
        if size == 0 {
            return Err(GuardError::validation("empty upload"));
        }
        let delta = i64::try_from(size).map_err(|_| GuardError::validation("upload too large"))?;

        let profile = self.profile(user_id).await?;
        let decision = evaluate_upload(&self.catalog, &profile, size);
        if !decision.allowed {
            debug!(user_id, size, remaining = decision.quota.remaining_bytes, "upload denied");
            return Err(GuardError::QuotaExceeded(decision.quota));
        }

        let experience_id = match request.experience_id.as_deref().map(str::trim) {
            None | Some("") => None,
            raw => match ExperienceTarget::parse(raw)? {
                ExperienceTarget::Unassigned => None,
                ExperienceTarget::Experience(id) => {
                    Some(self.owned_experience(user_id, &id).await?.id)
                }
            },
        };

        let path = object_path(user_id, request.filename.as_deref());
        self.blobs.put(&path, request.data).await?;

        let now = now_unix();
        let image = ImageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: user_id.to_string(),
            storage_path: path.clone(),
            experience_id,
            metadata: Metadata::new(),
            size_bytes: size,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.records.insert_image(&image).await {
            if let Err(cleanup) = self.blobs.delete(&path).await {
                warn!(path, error = %cleanup, "orphaned blob after failed record insert");
            }
            return Err(e);
        }

        let commit = match self.commit_usage_delta(user_id, delta).await {
            Ok(c) => c,
            Err(e) => {
                error!(
                    user_id,
                    image_id = %image.id,
                    size,
                    error = %e,
                    "usage commit failed after upload, accounting drift"
                );
                return Err(e);
            }
        };

        let (_, limits) = self.catalog.resolve(&profile.subscription_tier);
        let quota = QuotaSnapshot::new(commit.used_bytes, limits.max_storage_bytes);
        if self.policy.recheck_on_commit && quota.is_over_limit() {
            warn!(
                user_id,
                used = quota.used_bytes,
                limit = quota.limit_bytes,
                "concurrent uploads overshot quota, rolling back"
            );
            let quota = self.roll_back_upload(user_id, &image, delta, quota).await?;
            return Err(GuardError::QuotaExceeded(quota));
        }

        info!(user_id, image_id = %image.id, size, used = commit.used_bytes, "image uploaded");
        Ok(StorageChange { image, commit, quota })
    }

    async fn roll_back_upload(
        &self,
        user_id: &str,
        image: &ImageRecord,
        delta: i64,
        fallback: QuotaSnapshot,
    ) -> Result<QuotaSnapshot, GuardError> {
        self.records.delete_image(user_id, &image.id).await?;
        if let Err(e) = self.blobs.delete(&image.storage_path).await {
            warn!(path = %image.storage_path, error = %e, "blob delete failed during rollback");
        }
        let commit = self.commit_usage_delta(user_id, -delta).await?;
        Ok(QuotaSnapshot::new(commit.used_bytes, fallback.limit_bytes))
    }

    /// Delete an image the caller owns and release its bytes.
    pub async fn delete_image(
        &self,
        user_id: &str,
        image_id: &str,
    ) -> Result<StorageChange, GuardError> {
        let profile = self.profile(user_id).await?;
        let image = self
            .records
            .delete_image(user_id, image_id)
            .await?
            .ok_or(GuardError::NotFoundOrForbidden)?;

        match self.blobs.delete(&image.storage_path).await {
            Ok(true) => {}
            Ok(false) => warn!(path = %image.storage_path, "blob already missing on delete"),
            Err(e) => warn!(path = %image.storage_path, error = %e, "blob delete failed"),
        }

        let delta = i64::try_from(image.size_bytes).unwrap_or(i64::MAX);
        let commit = self.commit_usage_delta(user_id, -delta).await?;
        let (_, limits) = self.catalog.resolve(&profile.subscription_tier);
        info!(user_id, image_id, freed = image.size_bytes, "image deleted");
        Ok(StorageChange {
            quota: QuotaSnapshot::new(commit.used_bytes, limits.max_storage_bytes),
            image,
            commit,
        })
    }

    // ── Experiences ──

    /// List the caller's experiences, oldest first.
    pub async fn list_experiences(
        &self,
        user_id: &str,
    ) -> Result<Vec<ExperienceRecord>, GuardError> {
        self.records.list_experiences(user_id).await
    }

    /// Create an experience within the tier's `max_experiences`.
    pub async fn create_experience(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<ExperienceRecord, GuardError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GuardError::validation("title is required"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(GuardError::validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }

        let profile = self.profile(user_id).await?;
        let (_, limits) = self.catalog.resolve(&profile.subscription_tier);
        let count = self.records.count_experiences(user_id).await?;
        if count >= u64::from(limits.max_experiences) {
            return Err(GuardError::ExperienceLimit {
                limit: limits.max_experiences,
            });
        }

        let experience = ExperienceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: user_id.to_string(),
            title: title.to_string(),
            created_at: now_unix(),
        };
        self.records.insert_experience(&experience).await?;
        Ok(experience)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wayfarer_core::MIB;

    use super::*;
    use crate::blob::{MemoryBlobStore, UrlSigner};
    use crate::memory::MemoryStore;

    struct Fixture {
        guard: Guard,
        records: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobStore>,
    }

    fn fixture_with(policy: GuardPolicy) -> Fixture {
        let records = Arc::new(MemoryStore::new());
        let signer = UrlSigner::new("test-signing-secret", "http://localhost/blobs").unwrap();
        let blobs = Arc::new(MemoryBlobStore::new(signer));
        let guard = Guard::new(
            records.clone(),
            blobs.clone(),
            Arc::new(TierCatalog::default()),
            policy,
        );
        Fixture { guard, records, blobs }
    }

    fn fixture() -> Fixture {
        fixture_with(GuardPolicy::default())
    }

    fn image(id: &str, owner: &str, size: u64) -> ImageRecord {
        ImageRecord {
            id: id.into(),
            owner_id: owner.into(),
            storage_path: format!("{owner}/{id}.jpg"),
            experience_id: None,
            metadata: Metadata::new(),
            size_bytes: size,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn experience(id: &str, owner: &str) -> ExperienceRecord {
        ExperienceRecord {
            id: id.into(),
            owner_id: owner.into(),
            title: id.into(),
            created_at: 0,
        }
    }

    fn meta(v: serde_json::Value) -> Metadata {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_ensure_profile_provisions_free() {
        let f = fixture();
        let p = f
            .guard
            .ensure_profile(&Identity::new("alice").with_email("a@example.com"))
            .await
            .unwrap();
        assert_eq!(p.subscription_tier, "free");
        assert_eq!(p.email.as_deref(), Some("a@example.com"));
        assert_eq!(p.storage_used_bytes, 0);
    }

    #[tokio::test]
    async fn test_quota_scenario_free_tier() {
        let f = fixture();
        f.records
            .put_profile(UserProfile::new("alice", Tier::Free).with_storage_used(480 * MIB));

        let denied = f.guard.check_upload("alice", 30 * MIB).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.quota.remaining_bytes, 20 * MIB);

        let ok = f.guard.check_upload("alice", 15 * MIB).await.unwrap();
        assert!(ok.allowed);
        let commit = f
            .guard
            .commit_usage_delta("alice", (15 * MIB) as i64)
            .await
            .unwrap();
        assert_eq!(commit.used_bytes, 495 * MIB);
    }

    #[tokio::test]
    async fn test_commit_unknown_user() {
        let f = fixture();
        let err = f.guard.commit_usage_delta("ghost", 5).await.unwrap_err();
        assert!(matches!(err, GuardError::NotFoundOrForbidden));
    }

    #[tokio::test]
    async fn test_commit_clamps() {
        let f = fixture();
        f.records
            .put_profile(UserProfile::new("alice", Tier::Free).with_storage_used(10));
        let c = f.guard.commit_usage_delta("alice", -50).await.unwrap();
        assert_eq!(c.used_bytes, 0);
        assert!(c.clamped());
    }

    #[tokio::test]
    async fn test_foreign_and_missing_image_identical() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));
        f.records.put_image(image("img-bob", "bob", 1));

        let foreign = f
            .guard
            .update_metadata("alice", "img-bob", meta(json!({"a": 1})))
            .await
            .unwrap_err();
        let missing = f
            .guard
            .update_metadata("alice", "img-none", meta(json!({"a": 1})))
            .await
            .unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
        assert_eq!(foreign.error_type(), missing.error_type());
        assert!(f.records.image("img-bob").unwrap().metadata.is_empty());

        let foreign = f.guard.issue_download_link("alice", "bob/img-bob.jpg").await.unwrap_err();
        let missing = f.guard.issue_download_link("alice", "alice/none.jpg").await.unwrap_err();
        assert_eq!(foreign.error_type(), missing.error_type());
    }

    #[tokio::test]
    async fn test_bulk_rejects_partial_ownership() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Traveler));
        f.records.put_image(image("a", "alice", 1));
        f.records.put_image(image("b", "alice", 1));
        f.records.put_image(image("c", "bob", 1));

        let err = f
            .guard
            .bulk_update_metadata("alice", &["a", "b", "c"], meta(json!({"tag": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::NotFoundOrForbidden));
        for id in ["a", "b", "c"] {
            assert!(f.records.image(id).unwrap().metadata.is_empty(), "{id} touched");
        }

        let updated = f
            .guard
            .bulk_update_metadata("alice", &["a", "b", "a"], meta(json!({"tag": "x"})))
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(f.records.image("a").unwrap().metadata["tag"], "x");
    }

    #[tokio::test]
    async fn test_bulk_tier_gate_before_validation() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));
        let empty: [&str; 0] = [];
        let err = f
            .guard
            .bulk_update_metadata("alice", &empty, Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Forbidden { required: Tier::Traveler }));
    }

    #[tokio::test]
    async fn test_bulk_limits() {
        let f = fixture_with(GuardPolicy {
            max_bulk_ids: 2,
            ..GuardPolicy::default()
        });
        f.records.put_profile(UserProfile::new("alice", Tier::Enterprise));
        let err = f
            .guard
            .bulk_update_metadata("alice", &["a", "b", "c"], Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Validation(_)));
        let err = f
            .guard
            .bulk_update_metadata("alice", &["  "], Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Validation(_)));
    }

    #[tokio::test]
    async fn test_move_to_foreign_experience_rejected() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));
        let mut img = image("img1", "alice", 1);
        img.experience_id = Some("exp-a".into());
        f.records.put_image(img);
        f.records.put_experience(experience("exp-a", "alice"));
        f.records.put_experience(experience("exp-b", "bob"));

        let err = f
            .guard
            .move_image("alice", "img1", Some("exp-b"))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::NotFoundOrForbidden));
        assert_eq!(
            f.records.image("img1").unwrap().experience_id.as_deref(),
            Some("exp-a")
        );

        let missing = f
            .guard
            .move_image("alice", "img1", Some("exp-zzz"))
            .await
            .unwrap_err();
        assert_eq!(missing.to_string(), err.to_string());
    }

    #[tokio::test]
    async fn test_move_to_unassigned_clears() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));
        let mut img = image("img1", "alice", 1);
        img.experience_id = Some("exp-a".into());
        f.records.put_image(img);

        let moved = f
            .guard
            .move_image("alice", "img1", Some("unassigned"))
            .await
            .unwrap();
        assert_eq!(moved.experience_id, None);

        let err = f.guard.move_image("alice", "img1", None).await.unwrap_err();
        assert!(matches!(err, GuardError::Validation(_)));
        let err = f
            .guard
            .move_image("bob", "img1", Some("unassigned"))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::NotFoundOrForbidden));
    }

    #[tokio::test]
    async fn test_upload_and_delete_track_usage() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));

        let up = f
            .guard
            .upload_image(
                "alice",
                UploadRequest {
                    filename: Some("beach.jpg".into()),
                    experience_id: None,
                    data: Bytes::from(vec![7u8; 1024]),
                },
            )
            .await
            .unwrap();
        assert_eq!(up.commit.used_bytes, 1024);
        assert!(f.blobs.contains(&up.image.storage_path));
        assert!(up.image.storage_path.starts_with("alice/"));

        let link = f
            .guard
            .issue_download_link("alice", &up.image.storage_path)
            .await
            .unwrap();
        assert!(link.url.contains(&up.image.storage_path));

        let del = f.guard.delete_image("alice", &up.image.id).await.unwrap();
        assert_eq!(del.commit.used_bytes, 0);
        assert!(f.blobs.is_empty());
        assert_eq!(f.records.storage_used("alice"), Some(0));
    }

    #[tokio::test]
    async fn test_upload_denied_leaves_nothing() {
        let f = fixture();
        f.records
            .put_profile(UserProfile::new("alice", Tier::Free).with_storage_used(500 * MIB));
        let err = f
            .guard
            .upload_image(
                "alice",
                UploadRequest {
                    data: Bytes::from_static(b"x"),
                    ..UploadRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::QuotaExceeded(q) if q.remaining_bytes == 0));
        assert!(f.blobs.is_empty());
        assert_eq!(f.records.storage_used("alice"), Some(500 * MIB));
    }

    #[tokio::test]
    async fn test_upload_into_foreign_experience_rejected() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));
        f.records.put_experience(experience("exp-b", "bob"));
        let err = f
            .guard
            .upload_image(
                "alice",
                UploadRequest {
                    experience_id: Some("exp-b".into()),
                    data: Bytes::from_static(b"x"),
                    ..UploadRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::NotFoundOrForbidden));
        assert!(f.blobs.is_empty());
    }

    /// Blob store that lands a competing commit while the upload is in
    /// flight, after the quota was evaluated.
    struct RacingBlobs {
        inner: MemoryBlobStore,
        records: Arc<MemoryStore>,
        competing_bytes: i64,
    }

    #[async_trait::async_trait]
    impl BlobStore for RacingBlobs {
        async fn put(&self, path: &str, data: Bytes) -> Result<(), GuardError> {
            self.records
                .add_storage_used("alice", self.competing_bytes)
                .await?;
            self.inner.put(path, data).await
        }

        async fn get(&self, path: &str) -> Result<Option<Bytes>, GuardError> {
            self.inner.get(path).await
        }

        async fn delete(&self, path: &str) -> Result<bool, GuardError> {
            self.inner.delete(path).await
        }

        async fn create_signed_url(
            &self,
            path: &str,
            ttl: Duration,
        ) -> Result<SignedLink, GuardError> {
            self.inner.create_signed_url(path, ttl).await
        }

        fn verify_signed(&self, path: &str, expires_at: i64, signature: &str) -> bool {
            self.inner.verify_signed(path, expires_at, signature)
        }
    }

    fn racing_guard(recheck_on_commit: bool) -> (Guard, Arc<MemoryStore>, Arc<RacingBlobs>) {
        let records = Arc::new(MemoryStore::new());
        records.put_profile(UserProfile::new("alice", Tier::Free).with_storage_used(499 * MIB));
        let signer = UrlSigner::new("test-signing-secret", "http://localhost/blobs").unwrap();
        let blobs = Arc::new(RacingBlobs {
            inner: MemoryBlobStore::new(signer),
            records: records.clone(),
            competing_bytes: MIB as i64,
        });
        let guard = Guard::new(
            records.clone(),
            blobs.clone(),
            Arc::new(TierCatalog::default()),
            GuardPolicy {
                recheck_on_commit,
                ..GuardPolicy::default()
            },
        );
        (guard, records, blobs)
    }

    #[tokio::test]
    async fn test_recheck_rolls_back_overshoot() {
        let (guard, records, blobs) = racing_guard(true);

        let err = guard
            .upload_image(
                "alice",
                UploadRequest {
                    data: Bytes::from(vec![0u8; MIB as usize]),
                    ..UploadRequest::default()
                },
            )
            .await
            .unwrap_err();

        match err {
            GuardError::QuotaExceeded(q) => assert_eq!(q.used_bytes, 500 * MIB),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(records.storage_used("alice"), Some(500 * MIB));
        assert!(records.list_images("alice").await.unwrap().is_empty());
        assert!(blobs.inner.is_empty());
    }

    #[tokio::test]
    async fn test_overshoot_kept_without_recheck() {
        let (guard, records, _blobs) = racing_guard(false);

        let up = guard
            .upload_image(
                "alice",
                UploadRequest {
                    data: Bytes::from(vec![0u8; MIB as usize]),
                    ..UploadRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(up.commit.used_bytes, 501 * MIB);
        assert!(up.quota.is_over_limit());
        assert_eq!(records.storage_used("alice"), Some(501 * MIB));
    }

    #[tokio::test]
    async fn test_create_experience_limit() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));
        for i in 0..3 {
            f.guard
                .create_experience("alice", &format!("Trip {i}"))
                .await
                .unwrap();
        }
        let err = f.guard.create_experience("alice", "Trip 4").await.unwrap_err();
        assert!(matches!(err, GuardError::ExperienceLimit { limit: 3 }));
        let err = f.guard.create_experience("alice", "   ").await.unwrap_err();
        assert!(matches!(err, GuardError::Validation(_)));
        assert_eq!(f.guard.list_experiences("alice").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_open_signed_blob() {
        let f = fixture();
        f.records.put_profile(UserProfile::new("alice", Tier::Free));
        f.records.put_image(image("img1", "alice", 3));
        f.blobs
            .put("alice/img1.jpg", Bytes::from_static(b"abc"))
            .await
            .unwrap();

        let link = f
            .guard
            .issue_download_link("alice", "alice/img1.jpg")
            .await
            .unwrap();
        let sig = link.url.rsplit_once("sig=").unwrap().1;
        let data = f
            .guard
            .open_signed_blob("alice/img1.jpg", link.expires_at, sig)
            .await
            .unwrap();
        assert_eq!(data, &b"abc"[..]);

        let err = f
            .guard
            .open_signed_blob("alice/img1.jpg", link.expires_at, "00")
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::NotFoundOrForbidden));
    }
}
