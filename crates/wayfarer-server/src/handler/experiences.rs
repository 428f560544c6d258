//! Experience handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use wayfarer_guard::ExperienceRecord;

use super::JsonBody;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateExperience {
    #[serde(default)]
    title: String,
}

pub(crate) async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExperienceRecord>>, ApiError> {
    Ok(Json(state.guard.list_experiences(user.id()).await?))
}

pub(crate) async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateExperience>,
) -> Result<(StatusCode, Json<ExperienceRecord>), ApiError> {
    let experience = state.guard.create_experience(user.id(), &body.title).await?;
    Ok((StatusCode::CREATED, Json(experience)))
}
