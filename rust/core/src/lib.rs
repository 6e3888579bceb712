// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Facade-Lite Core
//!
//! Data model shared by the facade annotation pipeline.
//!
//! ## Overview
//!
//! - **GeoJSON**: the feature-collection subset used for window annotations,
//!   placed windows and building footprints
//! - **Model**: pixel rectangles drawn on photos, photo camera metadata and
//!   the typed view of window feature properties
//! - **Reference table**: per-photo camera poses used as an orientation
//!   fallback when a building has no wall geometry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use facade_lite_core::{FeatureCollection, ReferenceTable};
//!
//! let fc = FeatureCollection::from_slice(br#"{"type":"FeatureCollection","features":[]}"#)?;
//! let table = ReferenceTable::parse("IMG_1.jpg, 106.8, -6.3, 90, 0, 0, 45");
//! assert!(fc.is_empty());
//! assert!(table.get("IMG_1.jpg").is_some());
//! ```

pub mod error;
pub mod geojson;
pub mod model;
pub mod reference;

pub use error::{Error, Result};
pub use geojson::{is_closed, Feature, FeatureCollection, Geometry, Position, Properties, Ring};
pub use model::{
    set_classification, stamp_placement, PhotoMetadata, PixelRect, WindowProperties,
    CLASSIFICATION_KEY, PHOTO_ANNOTATION_SOURCE,
};
pub use reference::{strip_upload_prefix, CameraPose, ReferenceTable};
