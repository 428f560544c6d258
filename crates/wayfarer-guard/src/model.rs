//! Records read and written through the [`RecordStore`](crate::RecordStore).

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Free-form image metadata (a JSON object).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Authenticated caller, as resolved by an [`IdentityProvider`](crate::IdentityProvider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Per-user subscription and usage state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    /// Raw tier id. Kept as text so an unrecognized value can be handled
    /// fail-closed instead of failing to load.
    pub subscription_tier: String,
    /// Changed only by guard-computed deltas.
    pub storage_used_bytes: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserProfile {
    /// A fresh profile with no usage.
    pub fn new(id: impl Into<String>, tier: Tier) -> Self {
        let now = now_unix();
        Self {
            id: id.into(),
            email: None,
            subscription_tier: tier.as_str().to_string(),
            storage_used_bytes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Builder: set current usage (tests and imports only).
    pub fn with_storage_used(mut self, bytes: u64) -> Self {
        self.storage_used_bytes = bytes;
        self
    }

    /// Parsed tier, `None` when the stored id is unknown.
    #[inline]
    pub fn tier(&self) -> Option<Tier> {
        Tier::parse(&self.subscription_tier)
    }
}

/// Uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub owner_id: String,
    pub storage_path: String,
    pub experience_id: Option<String>,
    pub metadata: Metadata,
    pub size_bytes: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Travel experience that images can be grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: i64,
}

/// Get current unix timestamp.
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
