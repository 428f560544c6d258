//! Image handlers: list, upload, delete, metadata, move, download.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use wayfarer_guard::{ImageRecord, Metadata, StorageChange, UploadRequest};
use wayfarer_metrics::{
    record_signed_link_issued, record_storage_clamped, record_storage_committed,
    record_upload_decision,
};

use super::JsonBody;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataBody {
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkMetadataBody {
    #[serde(default)]
    image_ids: Vec<String>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkMetadataResponse {
    count: usize,
    records: Vec<ImageRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveBody {
    #[serde(default)]
    experience_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    filename: Option<String>,
    experience_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadQuery {
    #[serde(default)]
    path: String,
}

fn required_metadata(metadata: Option<Metadata>) -> Result<Metadata, ApiError> {
    metadata.ok_or_else(|| wayfarer_guard::GuardError::validation("metadata is required").into())
}

fn record_change(change: &StorageChange, delta_bytes: i64) {
    record_storage_committed(delta_bytes);
    if change.commit.clamped() {
        record_storage_clamped();
    }
}

pub(crate) async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    Ok(Json(state.guard.list_images(user.id()).await?))
}

pub(crate) async fn upload(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<StorageChange>), ApiError> {
    let request = UploadRequest {
        filename: query.filename,
        experience_id: query.experience_id,
        data: body,
    };
    let change = state.guard.upload_image(user.id(), request).await?;
    record_upload_decision(true);
    record_change(&change, change.image.size_bytes as i64);
    Ok((StatusCode::CREATED, Json(change)))
}

pub(crate) async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StorageChange>, ApiError> {
    let change = state.guard.delete_image(user.id(), &id).await?;
    record_change(&change, -(change.image.size_bytes as i64));
    Ok(Json(change))
}

pub(crate) async fn update_metadata(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<MetadataBody>,
) -> Result<Json<ImageRecord>, ApiError> {
    let metadata = required_metadata(body.metadata)?;
    Ok(Json(
        state.guard.update_metadata(user.id(), &id, metadata).await?,
    ))
}

pub(crate) async fn bulk_update_metadata(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<BulkMetadataBody>,
) -> Result<Json<BulkMetadataResponse>, ApiError> {
    let metadata = required_metadata(body.metadata)?;
    let records = state
        .guard
        .bulk_update_metadata(user.id(), &body.image_ids, metadata)
        .await?;
    Ok(Json(BulkMetadataResponse {
        count: records.len(),
        records,
    }))
}

pub(crate) async fn move_image(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<MoveBody>,
) -> Result<Json<ImageRecord>, ApiError> {
    Ok(Json(
        state
            .guard
            .move_image(user.id(), &id, body.experience_id.as_deref())
            .await?,
    ))
}

/// Redirect to a short-lived signed link for an owned image.
pub(crate) async fn download(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let link = state
        .guard
        .issue_download_link(user.id(), &query.path)
        .await?;
    record_signed_link_issued();
    Ok((StatusCode::FOUND, [(LOCATION, link.url)]).into_response())
}
