// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use facade_lite_core::PixelRect;
use serde::Deserialize;

/// Body of `POST /api/project/{buildingId}/{imageName}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRequest {
    /// Rectangles drawn on the photo, in pixels.
    pub rects: Vec<PixelRect>,

    /// Also store the result as the photo's window annotation.
    #[serde(default)]
    pub save: bool,
}

/// Body of the classification update for a placed window.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationRequest {
    #[serde(rename = "jenisJendela")]
    pub classification: String,
}
