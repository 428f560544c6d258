//! Access and quota guard for wayfarer.
//!
//! This crate decides whether a request may touch a user's images and
//! experiences, and keeps each user's recorded storage usage consistent with
//! what is actually stored.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wayfarer_guard::{
//!     Guard, GuardPolicy, Identity, MemoryBlobStore, MemoryStore, TierCatalog, UrlSigner,
//! };
//!
//! # async fn example() -> Result<(), wayfarer_guard::GuardError> {
//! let signer = UrlSigner::new("a-long-signing-secret", "http://localhost:8080/blobs")?;
//! let guard = Guard::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryBlobStore::new(signer)),
//!     Arc::new(TierCatalog::default()),
//!     GuardPolicy::default(),
//! );
//!
//! // First sight of a user provisions a free-tier profile.
//! let profile = guard.ensure_profile(&Identity::new("alice")).await?;
//! let decision = guard.check_upload(&profile.id, 15 * 1024 * 1024).await?;
//! assert!(decision.allowed);
//! # Ok(())
//! # }
//! ```

pub mod blob;
mod error;
mod guard;
mod hash;
pub mod identity;
mod memory;
mod model;
mod ownership;
mod quota;
mod size;
mod tier;
mod traits;

#[cfg(feature = "sql")]
pub mod cli;
#[cfg(feature = "sql")]
pub mod sql;

pub use blob::{FsBlobStore, MemoryBlobStore, UrlSigner};
pub use error::GuardError;
pub use guard::{Assignment, Guard, GuardPolicy, MAX_TITLE_CHARS, StorageChange, UploadRequest};
pub use hash::{is_token_hash, sha224_hex, verify_token};
#[cfg(feature = "http")]
pub use identity::HttpIdentity;
pub use identity::StaticIdentity;
pub use memory::MemoryStore;
pub use model::{ExperienceRecord, Identity, ImageRecord, Metadata, UserProfile, now_unix};
pub use ownership::{
    ExperienceTarget, authorize_experience_access, authorize_image_access, normalize_ids,
};
pub use quota::{
    DenialReason, QuotaSnapshot, UploadDecision, UsageCommit, apply_delta, evaluate_upload,
};
pub use size::{deserialize_size, format_bytes, parse_size};
pub use tier::{Tier, TierCatalog, TierLimits, default_tier_limits, meets_requirement};
pub use traits::{BlobStore, IdentityProvider, RecordStore, SignedLink};

#[cfg(feature = "sql")]
pub use cli::GuardArgs;
