// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-photo window annotations.

use crate::error::ApiError;
use crate::services::{AnnotationStore, Collection};
use crate::types::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

const GEOJSON_EXT: &str = ".geojson";

/// Storage key of a photo's annotation.
pub fn annotation_key(image_name: &str) -> String {
    if image_name.ends_with(GEOJSON_EXT) {
        image_name.to_string()
    } else {
        format!("{image_name}{GEOJSON_EXT}")
    }
}

pub fn is_geojson(key: &str) -> bool {
    key.ends_with(GEOJSON_EXT)
}

/// POST /api/annotations/:building_id/:image_name - Save an annotation.
pub async fn save(
    State(state): State<AppState>,
    Path((building_id, image_name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>, ApiError> {
    let key = annotation_key(&image_name);
    let data = serde_json::to_vec_pretty(&body)?;
    state
        .store
        .save(Collection::Annotations, &building_id, &key, &data)
        .await?;

    tracing::info!(building = %building_id, key = %key, "Annotation saved");
    Ok(Json(MessageResponse::new("Annotation saved.")))
}

/// GET /api/annotations/:building_id - List annotation files.
pub async fn list(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let keys = state
        .store
        .list(Collection::Annotations, &building_id)
        .await?
        .into_iter()
        .filter(|k| is_geojson(k))
        .collect();
    Ok(Json(keys))
}

/// DELETE /api/annotations/:building_id/:filename - Delete one annotation.
pub async fn delete(
    State(state): State<AppState>,
    Path((building_id, filename)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .store
        .delete(Collection::Annotations, &building_id, &filename)
        .await?;

    tracing::info!(building = %building_id, key = %filename, "Annotation deleted");
    Ok(Json(MessageResponse::new("Annotation deleted successfully.")))
}
