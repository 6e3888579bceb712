// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal GeoJSON model
//!
//! Only the subset the annotation pipeline reads and writes: feature
//! collections of `Polygon` / `MultiPolygon` features with free-form
//! properties. Positions keep whatever dimensionality the source used
//! (`[lon, lat]` or `[lon, lat, z]`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A GeoJSON position: `[lon, lat]` or `[lon, lat, z]`
pub type Position = Vec<f64>;

/// Linear ring (first position repeated as last when closed)
pub type Ring = Vec<Position>;

/// Free-form feature properties
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionTag {
    #[default]
    FeatureCollection,
}

/// Geometry variants understood by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
    /// Any geometry type we do not process; skipped downstream
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Build a single-ring polygon
    pub fn polygon(ring: Ring) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// Outer ring of a polygon, `None` for every other geometry
    pub fn outer_ring(&self) -> Option<&Ring> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: FeatureTag,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            kind: FeatureTag::Feature,
            geometry: Some(geometry),
            properties,
        }
    }

    /// Outer ring if this feature is a polygon
    pub fn outer_ring(&self) -> Option<&Ring> {
        self.geometry.as_ref().and_then(Geometry::outer_ring)
    }

    /// String property lookup
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Numeric property lookup; non-numbers read as absent
    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: FeatureCollectionTag,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: FeatureCollectionTag::FeatureCollection,
            features,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// Returns true if the ring's first and last positions are identical
pub fn is_closed(ring: &[Position]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => ring.len() > 1 && first == last,
        _ => false,
    }
}
