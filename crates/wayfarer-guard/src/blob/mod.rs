//! Blob storage and signed retrieval links.
//!
//! - [`MemoryBlobStore`]: in-process map (tests, demos)
//! - [`FsBlobStore`]: files under a root directory
//!
//! Both stores sign links with a [`UrlSigner`]; the server verifies them on
//! `GET /blobs/{*path}`.

mod fs;
mod memory;
mod signer;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use signer::UrlSigner;

use crate::error::GuardError;

/// Check that a storage path is a relative, slash-separated key made of
/// safe characters with no `.`/`..` segments.
pub fn validate_blob_path(path: &str) -> Result<(), GuardError> {
    if path.is_empty() || path.len() > 512 {
        return Err(GuardError::validation("invalid storage path length"));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(GuardError::validation("storage path must be relative"));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(GuardError::validation("invalid storage path segment"));
        }
        if !segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        {
            return Err(GuardError::validation("invalid character in storage path"));
        }
    }
    Ok(())
}

/// Reduce an arbitrary id to a path-safe segment.
pub fn sanitize_segment(raw: &str) -> String {
    let s: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(128)
        .collect();
    if s.is_empty() { "_".to_string() } else { s }
}

/// Build the storage path for a new upload: `{owner}/{uuid}.{ext}`.
pub fn object_path(owner_id: &str, filename: Option<&str>) -> String {
    let ext = filename
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.bytes().all(|b| b.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string());
    format!(
        "{}/{}.{}",
        sanitize_segment(owner_id),
        uuid::Uuid::new_v4(),
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_blob_path() {
        assert!(validate_blob_path("alice/abc.jpg").is_ok());
        assert!(validate_blob_path("../etc/passwd").is_err());
        assert!(validate_blob_path("/abs/path").is_err());
        assert!(validate_blob_path("a//b").is_err());
        assert!(validate_blob_path("a\\b").is_err());
        assert!(validate_blob_path("a/./b").is_err());
        assert!(validate_blob_path("").is_err());
    }

    #[test]
    fn test_object_path_shape() {
        let p = object_path("user@example.com", Some("Photo.JPG"));
        assert!(p.starts_with("user_example_com/"));
        assert!(p.ends_with(".jpg"));
        assert!(validate_blob_path(&p).is_ok());

        let p = object_path("u1", Some("no-extension"));
        assert!(p.ends_with(".bin"));
        let p = object_path("u1", Some("evil.p/h"));
        assert!(p.ends_with(".bin"));
    }
}
