// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placed windows: annotations committed to a building for 3D layout.

use super::annotations::is_geojson;
use crate::error::ApiError;
use crate::services::{validate_component, AnnotationStore, Collection};
use crate::types::{ClassificationRequest, MessageResponse, PlaceResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use facade_lite_core::{set_classification, stamp_placement, FeatureCollection};

/// Placed-window key for a photo: its base name plus `.geojson`.
pub fn placed_key(image_name: &str) -> Option<String> {
    let stem = std::path::Path::new(image_name).file_stem()?.to_str()?;
    Some(format!("{stem}.geojson"))
}

/// POST /api/placeAnnotationOnBuilding - Commit an annotation to its building.
///
/// The building and photo are read from the first feature's properties.
pub async fn place(
    State(state): State<AppState>,
    Json(mut fc): Json<FeatureCollection>,
) -> Result<Json<PlaceResponse>, ApiError> {
    let first = fc.features.first();
    let image_name = first.and_then(|f| f.property_str("imageName")).map(str::to_string);
    let building_id = first.and_then(|f| f.property_str("buildingId")).map(str::to_string);
    let (Some(image_name), Some(building_id)) = (image_name, building_id) else {
        return Err(ApiError::BadRequest(
            "Missing imageName or buildingId in properties.".into(),
        ));
    };

    let key = placed_key(&image_name)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid image name '{image_name}'")))?;
    validate_component(&building_id)?;

    stamp_placement(&mut fc.features, &building_id, &image_name);
    state
        .store
        .write_collection(Collection::PlacedWindows, &building_id, &key, &fc)
        .await?;

    tracing::info!(
        building = %building_id,
        key = %key,
        features = fc.len(),
        "Annotation placed on building"
    );
    Ok(Json(PlaceResponse {
        status: "success".into(),
        message: format!("Annotation saved to placed_windows/{building_id}/{key}"),
        file_path: format!("placed/{building_id}/{key}"),
    }))
}

/// GET /api/placed_windows/:building_id - List placed-window files.
pub async fn list(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let keys = state
        .store
        .list(Collection::PlacedWindows, &building_id)
        .await?
        .into_iter()
        .filter(|k| is_geojson(k))
        .collect();
    Ok(Json(keys))
}

/// GET /api/placed_windows/:building_id/:filename - Read one placed window.
pub async fn read(
    State(state): State<AppState>,
    Path((building_id, filename)): Path<(String, String)>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let fc = state
        .store
        .read_collection(Collection::PlacedWindows, &building_id, &filename)
        .await?;
    Ok(Json(fc))
}

/// PUT /api/placed_windows/:building_id/:filename - Overwrite one placed window.
pub async fn update(
    State(state): State<AppState>,
    Path((building_id, filename)): Path<(String, String)>,
    Json(fc): Json<FeatureCollection>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state
        .store
        .exists(Collection::PlacedWindows, &building_id, &filename)
        .await?
    {
        return Err(ApiError::NotFound(format!("{building_id}/{filename}")));
    }

    state
        .store
        .write_collection(Collection::PlacedWindows, &building_id, &filename, &fc)
        .await?;

    tracing::info!(building = %building_id, key = %filename, "Placed window updated");
    Ok(Json(MessageResponse::new("Placed window updated.")))
}

/// PUT /api/placed_windows/:building_id/:filename/classification - Set `jenisJendela`.
pub async fn classify(
    State(state): State<AppState>,
    Path((building_id, filename)): Path<(String, String)>,
    Json(req): Json<ClassificationRequest>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let mut fc = state
        .store
        .read_collection(Collection::PlacedWindows, &building_id, &filename)
        .await?;

    set_classification(&mut fc.features, req.classification.trim());
    state
        .store
        .write_collection(Collection::PlacedWindows, &building_id, &filename, &fc)
        .await?;

    tracing::info!(
        building = %building_id,
        key = %filename,
        classification = %req.classification.trim(),
        "Placed window classified"
    );
    Ok(Json(fc))
}

/// DELETE /api/placed/:building_id/:filename - Delete one placed window.
///
/// Also drops the file's boxes from the building scene.
pub async fn delete(
    State(state): State<AppState>,
    Path((building_id, filename)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !is_geojson(&filename) {
        return Err(ApiError::BadRequest("Invalid file type.".into()));
    }

    state
        .store
        .delete(Collection::PlacedWindows, &building_id, &filename)
        .await?;
    let had_boxes = state.scene.remove_file(&building_id, &filename);

    tracing::info!(building = %building_id, key = %filename, had_boxes, "Placed window deleted");
    Ok(Json(MessageResponse::new(format!("Deleted {filename}"))))
}
