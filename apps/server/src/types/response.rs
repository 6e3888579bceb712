// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use crate::services::SceneEntry;
use facade_lite_geometry::PixelRing;
use serde::{Deserialize, Serialize};

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One uploaded photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub name: String,
    /// Static URL under `/uploaded`.
    pub url: String,
}

impl ImageEntry {
    pub fn new(building: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            url: format!("/uploaded/{}/{}", building, name),
            name,
        }
    }
}

/// Result of a photo upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<ImageEntry>,
}

/// Result of committing an annotation to a building.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResponse {
    pub status: String,
    pub message: String,
    /// Static path under `/placed`.
    pub file_path: String,
}

/// Photo pixel rings of a saved annotation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprojectResponse {
    pub image_name: String,
    pub width: u32,
    pub height: u32,
    pub rings: Vec<PixelRing>,
}

/// Result of laying out a building's placed windows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResponse {
    pub building_id: String,
    pub wall_count: usize,
    /// Files whose placements were recorded in the scene.
    pub entries: Vec<SceneEntry>,
    /// Files computed after the scene was destroyed.
    pub dropped: Vec<String>,
}

/// Viewer configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfigResponse {
    pub access_token: Option<String>,
}
