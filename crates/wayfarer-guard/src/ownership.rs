//! Ownership predicates.

use wayfarer_core::UNASSIGNED_EXPERIENCE;

use crate::error::GuardError;
use crate::model::{ExperienceRecord, ImageRecord};

/// Whether `requester_id` owns `image`.
#[inline]
pub fn authorize_image_access(requester_id: &str, image: &ImageRecord) -> bool {
    image.owner_id == requester_id
}

/// Whether `requester_id` owns `experience`.
#[inline]
pub fn authorize_experience_access(requester_id: &str, experience: &ExperienceRecord) -> bool {
    experience.owner_id == requester_id
}

/// Where a move request wants an image to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperienceTarget {
    /// Clear the image's experience.
    Unassigned,
    /// Attach the image to this experience.
    Experience(String),
}

impl ExperienceTarget {
    /// Parse the raw `experience_id` field of a move request.
    ///
    /// The literal `"unassigned"` clears the assignment; a missing or blank id
    /// is a validation error.
    pub fn parse(raw: Option<&str>) -> Result<Self, GuardError> {
        match raw.map(str::trim) {
            None | Some("") => Err(GuardError::validation("experience_id is required")),
            Some(UNASSIGNED_EXPERIENCE) => Ok(Self::Unassigned),
            Some(id) => Ok(Self::Experience(id.to_string())),
        }
    }

    /// Experience id to persist (`None` for unassigned).
    pub fn experience_id(&self) -> Option<&str> {
        match self {
            Self::Unassigned => None,
            Self::Experience(id) => Some(id),
        }
    }
}

/// Normalize a bulk id list: trim, drop blanks, deduplicate keeping order.
pub fn normalize_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        let id = id.as_ref().trim();
        if !id.is_empty() && !out.iter().any(|seen| seen == id) {
            out.push(id.to_string());
        }
    }
    out
}
