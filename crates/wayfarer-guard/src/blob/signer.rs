//! HMAC-SHA256 link signing.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::GuardError;
use crate::model::now_unix;
use crate::traits::SignedLink;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies time-limited blob links.
///
/// A link is `{public_url}/{path}?expires={unix}&sig={hex}` where `sig` is
/// HMAC-SHA256 over `"{path}\n{expires}"`.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
    public_url: String,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Create a signer. The secret must be at least
    /// [`MIN_SIGNING_SECRET_BYTES`](wayfarer_core::MIN_SIGNING_SECRET_BYTES) long.
    pub fn new(
        secret: impl AsRef<[u8]>,
        public_url: impl Into<String>,
    ) -> Result<Self, GuardError> {
        let key = secret.as_ref();
        if key.len() < wayfarer_core::MIN_SIGNING_SECRET_BYTES {
            return Err(GuardError::Configuration(format!(
                "signing secret must be at least {} bytes",
                wayfarer_core::MIN_SIGNING_SECRET_BYTES
            )));
        }
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| GuardError::Configuration(format!("signing key: {e}")))?;
        let public_url = public_url.into().trim_end_matches('/').to_string();
        Ok(Self { mac, public_url })
    }

    /// Hex signature for `path` expiring at `expires_at`.
    pub fn signature(&self, path: &str, expires_at: i64) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{path}\n{expires_at}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Issue a link for `path` valid for `ttl` from now.
    pub fn sign(&self, path: &str, ttl: Duration) -> SignedLink {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now_unix().saturating_add(ttl_secs);
        self.sign_until(path, expires_at)
    }

    /// Issue a link for `path` with an explicit expiry.
    pub fn sign_until(&self, path: &str, expires_at: i64) -> SignedLink {
        let sig = self.signature(path, expires_at);
        SignedLink {
            url: format!(
                "{}/{path}?expires={expires_at}&sig={sig}",
                self.public_url
            ),
            expires_at,
        }
    }

    /// Check signature (constant time) and expiry.
    pub fn verify(&self, path: &str, expires_at: i64, signature: &str) -> bool {
        self.verify_at(path, expires_at, signature, now_unix())
    }

    /// [`verify`](Self::verify) against a caller-supplied clock.
    pub fn verify_at(&self, path: &str, expires_at: i64, signature: &str, now: i64) -> bool {
        if expires_at < now {
            return false;
        }
        let Ok(sig) = hex::decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(format!("{path}\n{expires_at}").as_bytes());
        mac.verify_slice(&sig).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UrlSigner {
        UrlSigner::new("0123456789abcdef0123", "http://localhost:8080/blobs/").unwrap()
    }

    #[test]
    fn test_rejects_short_secret() {
        assert!(matches!(
            UrlSigner::new("short", "http://x"),
            Err(GuardError::Configuration(_))
        ));
    }

    #[test]
    fn test_sign_and_verify() {
        let s = signer();
        let link = s.sign("alice/a.jpg", Duration::from_secs(60));
        assert!(link.url.starts_with("http://localhost:8080/blobs/alice/a.jpg?expires="));
        let sig = link.url.rsplit_once("sig=").unwrap().1;
        assert!(s.verify("alice/a.jpg", link.expires_at, sig));
        assert!(!s.verify("bob/a.jpg", link.expires_at, sig));
        assert!(!s.verify("alice/a.jpg", link.expires_at + 1, sig));
        assert!(!s.verify("alice/a.jpg", link.expires_at, "zz"));
    }

    #[test]
    fn test_expired_link_rejected() {
        let s = signer();
        let link = s.sign_until("alice/a.jpg", 1_000);
        let sig = s.signature("alice/a.jpg", 1_000);
        assert!(link.url.ends_with(&sig));
        assert!(s.verify_at("alice/a.jpg", 1_000, &sig, 1_000));
        assert!(!s.verify_at("alice/a.jpg", 1_000, &sig, 1_001));
    }

    #[test]
    fn test_different_secret_rejected() {
        let a = signer();
        let b = UrlSigner::new("another-secret-value!", "http://x").unwrap();
        let sig = a.signature("p/x.jpg", i64::MAX);
        assert!(!b.verify("p/x.jpg", i64::MAX, &sig));
    }
}
