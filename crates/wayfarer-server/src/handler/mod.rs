//! HTTP handlers.

pub(crate) mod blobs;
pub(crate) mod experiences;
pub(crate) mod images;
pub(crate) mod storage;

use axum::Json;
use axum::extract::{FromRequest, Request, State};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wayfarer_guard::{GuardError, Tier, TierLimits};

use crate::error::ApiError;
use crate::state::AppState;

/// JSON body whose rejections surface as validation errors.
pub(crate) struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(GuardError::validation(rejection.body_text()).into()),
        }
    }
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub(crate) struct TierEntry<'a> {
    tier: Tier,
    #[serde(flatten)]
    limits: &'a TierLimits,
}

/// Public tier catalog.
pub(crate) async fn list_tiers(State(state): State<AppState>) -> Json<serde_json::Value> {
    let entries: Vec<TierEntry<'_>> = state
        .guard
        .catalog()
        .iter()
        .map(|(tier, limits)| TierEntry { tier, limits })
        .collect();
    Json(serde_json::json!({ "tiers": entries }))
}
