//! Storage quota evaluation and usage arithmetic.
//!
//! Evaluation is read-only. Committing a size change is a separate step that
//! happens only after the blob write has landed (see
//! [`Guard::commit_usage_delta`](crate::Guard::commit_usage_delta)).

use serde::{Deserialize, Serialize};

use crate::model::UserProfile;
use crate::tier::TierCatalog;

/// Usage against limit at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub used_bytes: u64,
    pub limit_bytes: u64,
    pub remaining_bytes: u64,
}

impl QuotaSnapshot {
    pub fn new(used_bytes: u64, limit_bytes: u64) -> Self {
        Self {
            used_bytes,
            limit_bytes,
            remaining_bytes: limit_bytes.saturating_sub(used_bytes),
        }
    }

    /// Snapshot for a profile, limit resolved through the catalog.
    pub fn for_profile(catalog: &TierCatalog, profile: &UserProfile) -> Self {
        let (_, limits) = catalog.resolve(&profile.subscription_tier);
        Self::new(profile.storage_used_bytes, limits.max_storage_bytes)
    }

    /// Whether usage is above the limit.
    #[inline]
    pub fn is_over_limit(&self) -> bool {
        self.used_bytes > self.limit_bytes
    }
}

/// Which constraint rejected an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    StorageLimitExceeded,
}

impl DenialReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenialReason::StorageLimitExceeded => "storage_limit_exceeded",
        }
    }
}

/// Result of [`evaluate_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDecision {
    pub allowed: bool,
    pub reason: Option<DenialReason>,
    pub quota: QuotaSnapshot,
}

/// Decide whether `candidate_size_bytes` fits in the profile's remaining quota.
///
/// An unrecognized tier is evaluated against the free tier limit.
pub fn evaluate_upload(
    catalog: &TierCatalog,
    profile: &UserProfile,
    candidate_size_bytes: u64,
) -> UploadDecision {
    let quota = QuotaSnapshot::for_profile(catalog, profile);
    let allowed = match quota.used_bytes.checked_add(candidate_size_bytes) {
        Some(total) => total <= quota.limit_bytes,
        None => false,
    };

    UploadDecision {
        allowed,
        reason: (!allowed).then_some(DenialReason::StorageLimitExceeded),
        quota,
    }
}

/// Outcome of applying a usage delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCommit {
    /// Usage after the delta was applied.
    pub used_bytes: u64,
    /// How far below zero the unclamped result would have gone.
    pub clamped_bytes: u64,
}

impl UsageCommit {
    /// Whether the delta had to be clamped at zero (accounting drift).
    #[inline]
    pub fn clamped(&self) -> bool {
        self.clamped_bytes > 0
    }
}

/// Apply a signed delta to a usage counter, clamping at zero.
///
/// Result is `max(0, current + delta)`; this is the same arithmetic the SQL
/// store runs in a single `UPDATE`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_delta(current: u64, delta: i64) -> UsageCommit {
    let sum = i128::from(current) + i128::from(delta);
    if sum < 0 {
        UsageCommit {
            used_bytes: 0,
            clamped_bytes: (-sum) as u64,
        }
    } else {
        UsageCommit {
            used_bytes: sum.min(i128::from(u64::MAX)) as u64,
            clamped_bytes: 0,
        }
    }
}
