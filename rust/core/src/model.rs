// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Annotation data model: pixel rectangles, photo metadata and the
//! properties stamped onto window features.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geojson::{Feature, Properties};

/// `source` property value written on every projected window feature
pub const PHOTO_ANNOTATION_SOURCE: &str = "photo-annotation";

/// Property key of the free-text window classification
pub const CLASSIFICATION_KEY: &str = "jenisJendela";

/// A user-drawn axis-aligned rectangle in photo pixels.
///
/// Width and height may be negative when the rectangle was dragged
/// right-to-left or bottom-to-top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same rectangle with non-negative width and height
    pub fn normalized(&self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-area or non-finite rectangles cannot be projected
    pub fn is_degenerate(&self) -> bool {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite();
        !finite || self.width == 0.0 || self.height == 0.0
    }

    /// Corners in top-left, top-right, bottom-right, bottom-left order
    pub fn corners(&self) -> [(f64, f64); 4] {
        let r = self.normalized();
        let (x1, y1) = (r.x, r.y);
        let (x2, y2) = (r.x + r.width, r.y + r.height);
        [(x1, y1), (x2, y1), (x2, y2), (x1, y2)]
    }
}

/// Camera metadata read from a photo's EXIF block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Decimal degrees, south negative
    pub latitude: Option<f64>,
    /// Decimal degrees, west negative
    pub longitude: Option<f64>,
    /// Metres
    pub altitude: Option<f64>,
    /// Millimetres
    pub focal_length: Option<f64>,
}

impl PhotoMetadata {
    pub fn has_georeference(&self) -> bool {
        self.latitude.is_some_and(f64::is_finite) && self.longitude.is_some_and(f64::is_finite)
    }
}

/// Properties carried by a window annotation feature.
///
/// Keys outside the known set are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_per_pixel: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_in_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_in_meters: Option<f64>,
    #[serde(
        rename = "jenisJendela",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub classification: Option<String>,
    #[serde(flatten)]
    pub extra: Properties,
}

impl WindowProperties {
    pub fn into_properties(self) -> Result<Properties> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::invalid(format!(
                "window properties serialized to {other}"
            ))),
        }
    }
}

/// Stamp `buildingId`/`imageName` onto every feature, as done when an
/// annotation is committed to a building's placement set.
pub fn stamp_placement(features: &mut [Feature], building_id: &str, image_name: &str) {
    for feature in features {
        feature.set_property("imageName", image_name);
        feature.set_property("buildingId", building_id);
    }
}

/// Set the free-text classification on every feature
pub fn set_classification(features: &mut [Feature], classification: &str) {
    for feature in features {
        feature.set_property(CLASSIFICATION_KEY, classification);
    }
}
