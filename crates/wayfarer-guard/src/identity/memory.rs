//! Static identity provider.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::GuardError;
use crate::hash::sha224_hex;
use crate::model::Identity;
use crate::traits::IdentityProvider;

/// Identity provider backed by a fixed token table.
///
/// Tokens are stored as SHA224 hashes. This is suitable for development and
/// small deployments; production setups normally point at an external auth
/// service through [`HttpIdentity`](super::HttpIdentity).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    users: HashMap<String, Identity>,
}

impl StaticIdentity {
    /// Create an empty provider. Every token is rejected.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from plaintext token to user id pairs.
    ///
    /// # Example
    /// ```
    /// use wayfarer_guard::StaticIdentity;
    ///
    /// let identity = StaticIdentity::from_tokens([
    ///     ("alice-token", "alice"),
    ///     ("bob-token", "bob"),
    /// ]);
    /// assert_eq!(identity.len(), 2);
    /// ```
    pub fn from_tokens<I, T, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: AsRef<str>,
        U: Into<String>,
    {
        let users = pairs
            .into_iter()
            .map(|(t, u)| (sha224_hex(t.as_ref()), Identity::new(u)))
            .collect();
        Self { users }
    }

    /// Register a plaintext token.
    #[inline]
    pub fn add_token(&mut self, token: &str, identity: Identity) {
        self.users.insert(sha224_hex(token), identity);
    }

    /// Register a pre-computed token hash.
    #[inline]
    pub fn add_hash(&mut self, hash: impl Into<String>, identity: Identity) {
        self.users.insert(hash.into().to_ascii_lowercase(), identity);
    }

    /// Get the number of registered tokens.
    #[inline]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if no tokens are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self, token: &str) -> Result<Option<Identity>, GuardError> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.users.get(&sha224_hex(token)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_token_resolves() {
        let identity = StaticIdentity::from_tokens([("secret", "alice")]);
        let user = identity.current_user("secret").await.unwrap().unwrap();
        assert_eq!(user.id, "alice");
    }

    #[tokio::test]
    async fn test_unknown_and_empty_tokens_rejected() {
        let identity = StaticIdentity::from_tokens([("secret", "alice")]);
        assert!(identity.current_user("other").await.unwrap().is_none());
        assert!(identity.current_user("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_hash_accepts_uppercase_hex() {
        let mut identity = StaticIdentity::new();
        identity.add_hash(
            sha224_hex("tok").to_ascii_uppercase(),
            Identity::new("bob").with_email("bob@example.com"),
        );
        let user = identity.current_user("tok").await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("bob@example.com"));
    }
}
