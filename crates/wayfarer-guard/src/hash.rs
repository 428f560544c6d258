//! Bearer token hashing utilities.

use sha2::{Digest, Sha224};

/// Compute SHA224 hash and return as lowercase hex string.
///
/// Static identities store only this digest, never the bearer token itself.
///
/// # Example
/// ```
/// use wayfarer_guard::sha224_hex;
///
/// let hash = sha224_hex("session-token");
/// assert_eq!(hash.len(), 56); // SHA224 = 224 bits = 28 bytes = 56 hex chars
/// ```
#[inline]
pub fn sha224_hex(input: &str) -> String {
    let mut hasher = Sha224::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Verify if a hash matches a plaintext token.
#[inline]
pub fn verify_token(token: &str, hash: &str) -> bool {
    sha224_hex(token) == hash
}

/// Whether a string looks like a token hash produced by [`sha224_hex`].
#[inline]
pub fn is_token_hash(s: &str) -> bool {
    s.len() == wayfarer_core::TOKEN_HASH_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
