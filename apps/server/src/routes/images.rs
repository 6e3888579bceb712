// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uploaded building photos.

use crate::error::ApiError;
use crate::services::{extract_metadata, AnnotationStore, Collection};
use crate::types::{ImageEntry, MessageResponse, UploadResponse};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use facade_lite_core::PhotoMetadata;
use std::time::{SystemTime, UNIX_EPOCH};

const UPLOAD_FIELD: &str = "images";

/// Stored name of an upload: `{millis}_{originalName}`, directories stripped.
fn upload_key(millis: u128, original: &str) -> Option<String> {
    let name = std::path::Path::new(original).file_name()?.to_str()?;
    Some(format!("{millis}_{name}"))
}

/// POST /api/upload/:building_id - Upload one or more photos.
pub async fn upload(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!(field_name = ?field.name(), "Ignoring multipart field");
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let key = upload_key(millis, &original)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid file name '{original}'")))?;

        let bytes = field.bytes().await?;
        state
            .store
            .save(Collection::Uploaded, &building_id, &key, &bytes)
            .await?;
        tracing::info!(building = %building_id, key = %key, size = bytes.len(), "Photo uploaded");
        files.push(ImageEntry::new(&building_id, key));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "no files in multipart field '{UPLOAD_FIELD}'"
        )));
    }

    Ok(Json(UploadResponse {
        message: "Uploaded successfully".into(),
        files,
    }))
}

/// GET /api/images/:building_id - List uploaded photos.
///
/// A building without uploads yields an empty list.
pub async fn list(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Result<Json<Vec<ImageEntry>>, ApiError> {
    let keys = match state.store.list(Collection::Uploaded, &building_id).await {
        Ok(keys) => keys,
        Err(facade_lite_core::Error::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(
        keys.into_iter()
            .map(|name| ImageEntry::new(&building_id, name))
            .collect(),
    ))
}

/// DELETE /api/images/:building_id/:filename - Delete one photo.
pub async fn delete(
    State(state): State<AppState>,
    Path((building_id, filename)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .store
        .delete(Collection::Uploaded, &building_id, &filename)
        .await?;

    tracing::info!(building = %building_id, key = %filename, "Photo deleted");
    Ok(Json(MessageResponse::new("File deleted")))
}

/// Read a stored photo's metadata off the async runtime.
pub async fn photo_metadata(state: &AppState, building_id: &str, filename: &str) -> Result<PhotoMetadata, ApiError> {
    let bytes = state
        .store
        .read(Collection::Uploaded, building_id, filename)
        .await?;
    tokio::task::spawn_blocking(move || extract_metadata(&bytes)).await?
}

/// GET /api/images/:building_id/:filename/metadata - Photo GPS and camera metadata.
pub async fn metadata(
    State(state): State<AppState>,
    Path((building_id, filename)): Path<(String, String)>,
) -> Result<Json<PhotoMetadata>, ApiError> {
    Ok(Json(photo_metadata(&state, &building_id, &filename).await?))
}
