//! Storage quota status and upload feasibility check.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use wayfarer_guard::{DenialReason, GuardError, QuotaSnapshot};
use wayfarer_metrics::record_upload_decision;

use super::JsonBody;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct StorageAction {
    #[serde(default)]
    action: String,
    #[serde(default)]
    size_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckResponse {
    can_upload: bool,
    reason: Option<DenialReason>,
    quota: QuotaSnapshot,
}

pub(crate) async fn status(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<QuotaSnapshot>, ApiError> {
    Ok(Json(state.guard.quota_status(user.id()).await?))
}

pub(crate) async fn check(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StorageAction>,
) -> Result<Json<CheckResponse>, ApiError> {
    if body.action != "check" {
        return Err(GuardError::validation(format!("unknown action '{}'", body.action)).into());
    }
    let size = body
        .size_bytes
        .ok_or_else(|| GuardError::validation("size_bytes is required"))?;

    let decision = state.guard.check_upload(user.id(), size).await?;
    record_upload_decision(decision.allowed);
    Ok(Json(CheckResponse {
        can_upload: decision.allowed,
        reason: decision.reason,
        quota: decision.quota,
    }))
}
