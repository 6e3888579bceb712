// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry endpoints: projection, re-projection, walls, facade layout and
//! the building scene.

use super::annotations::{annotation_key, is_geojson};
use super::images::photo_metadata;
use crate::error::ApiError;
use crate::services::{AnnotationStore, Collection, SceneEntry};
use crate::types::{LayoutResponse, MessageResponse, ProjectRequest, ReprojectResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use facade_lite_core::{FeatureCollection, ReferenceTable};
use facade_lite_geometry::{
    layout_facade, project_rects, reproject_collection, walls_for_building, PhotoFrame,
    Placement, WallSegment,
};
use std::sync::Arc;
use tokio::task::JoinSet;

/// POST /api/project/:building_id/:image_name - Project rectangles drawn on a photo.
///
/// Fails with 422 when the photo has no GPS position. With `save` set the
/// result is also stored as the photo's annotation.
pub async fn project(
    State(state): State<AppState>,
    Path((building_id, image_name)): Path<(String, String)>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let meta = photo_metadata(&state, &building_id, &image_name).await?;
    let frame = PhotoFrame::from_metadata(&image_name, &meta, &state.camera)?;
    let fc = project_rects(&frame, &req.rects, &image_name, &building_id)?;

    if req.save {
        let key = annotation_key(&image_name);
        state
            .store
            .write_collection(Collection::Annotations, &building_id, &key, &fc)
            .await?;
        tracing::info!(building = %building_id, key = %key, features = fc.len(), "Projected annotation saved");
    }

    Ok(Json(fc))
}

/// GET /api/reproject/:building_id/:image_name - Re-project a saved annotation onto its photo.
pub async fn reproject(
    State(state): State<AppState>,
    Path((building_id, image_name)): Path<(String, String)>,
) -> Result<Json<ReprojectResponse>, ApiError> {
    let meta = photo_metadata(&state, &building_id, &image_name).await?;
    let frame = PhotoFrame::from_metadata(&image_name, &meta, &state.camera)?;
    let fc = state
        .store
        .read_collection(Collection::Annotations, &building_id, &annotation_key(&image_name))
        .await?;

    Ok(Json(ReprojectResponse {
        rings: reproject_collection(&frame, &fc),
        image_name,
        width: meta.width,
        height: meta.height,
    }))
}

/// GET /api/walls/:building_id - Wall segments of a building.
pub async fn walls(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Result<Json<Vec<WallSegment>>, ApiError> {
    let footprints = state.datasets.footprints().await?;
    Ok(Json(walls_for_building(&footprints, &building_id)))
}

/// Lay out one placed-window file and record it in the scene.
///
/// Returns the file name, its boxes and whether the scene accepted them.
async fn layout_file(
    state: AppState,
    building_id: String,
    key: String,
    generation: u64,
    walls: Arc<Vec<WallSegment>>,
    reference: Option<Arc<ReferenceTable>>,
) -> Result<(String, Vec<Placement>, bool), ApiError> {
    let fc = state
        .store
        .read_collection(Collection::PlacedWindows, &building_id, &key)
        .await?;
    let config = state.layout;

    if state.scene.is_destroyed(&building_id) {
        return Ok((key, Vec::new(), false));
    }

    let placements = tokio::task::spawn_blocking(move || {
        layout_facade(&fc.features, &walls, reference.as_deref(), &config)
    })
    .await?;

    let recorded = state
        .scene
        .record(&building_id, &key, generation, placements.clone());
    Ok((key, placements, recorded))
}

/// POST /api/layout/:building_id - Lay out every placed window of a building.
///
/// One task per placed-window file; results land in the scene as they
/// finish. Files that fail to load are skipped. An unreadable reference
/// table only removes the reference fallback.
pub async fn layout(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Result<Json<LayoutResponse>, ApiError> {
    let keys = match state
        .store
        .list(Collection::PlacedWindows, &building_id)
        .await
    {
        Ok(keys) => keys,
        Err(facade_lite_core::Error::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    let footprints = state.datasets.footprints().await?;
    let walls = Arc::new(walls_for_building(&footprints, &building_id));
    let reference = match state.datasets.reference().await {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!(building = %building_id, error = %e, "Reference table unavailable");
            None
        }
    };

    let generation = state.scene.open(&building_id);

    let mut tasks = JoinSet::new();
    for key in keys.into_iter().filter(|k| is_geojson(k)) {
        tasks.spawn(layout_file(
            state.clone(),
            building_id.clone(),
            key,
            generation,
            Arc::clone(&walls),
            reference.clone(),
        ));
    }

    let mut entries = Vec::new();
    let mut dropped = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok((file, placements, true)) => entries.push(SceneEntry { file, placements }),
            Ok((file, _, false)) => dropped.push(file),
            Err(e) => tracing::warn!(building = %building_id, error = %e, "Skipping placed window"),
        }
    }
    entries.sort_by(|a, b| a.file.cmp(&b.file));
    dropped.sort();

    tracing::info!(
        building = %building_id,
        walls = walls.len(),
        files = entries.len(),
        dropped = dropped.len(),
        "Facade layout complete"
    );
    Ok(Json(LayoutResponse {
        building_id,
        wall_count: walls.len(),
        entries,
        dropped,
    }))
}

/// GET /api/scene/:building_id - Laid-out windows of a building.
pub async fn scene(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Json<Vec<SceneEntry>> {
    Json(state.scene.entries(&building_id))
}

/// DELETE /api/scene/:building_id - Tear down a building's scene.
pub async fn destroy_scene(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Json<MessageResponse> {
    state.scene.destroy(&building_id);
    Json(MessageResponse::new(format!("Scene for {building_id} destroyed")))
}
