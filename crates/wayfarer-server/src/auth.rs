//! Bearer-token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;
use wayfarer_guard::{GuardError, Identity, UserProfile};
use wayfarer_metrics::record_auth_failure;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller and their profile.
///
/// Extraction resolves the bearer token through the identity provider and
/// provisions a free-tier profile on first sight.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
    pub profile: UserProfile,
}

impl AuthUser {
    #[inline]
    pub fn id(&self) -> &str {
        &self.identity.id
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            record_auth_failure();
            return Err(GuardError::Unauthenticated.into());
        };
        let identity = match state.identity.current_user(token).await? {
            Some(identity) if !identity.id.is_empty() => identity,
            _ => {
                debug!("bearer token rejected");
                record_auth_failure();
                return Err(GuardError::Unauthenticated.into());
            }
        };
        let profile = state.guard.ensure_profile(&identity).await?;
        Ok(Self { identity, profile })
    }
}
