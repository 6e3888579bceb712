// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Photo pixel ↔ world coordinate projection
//!
//! Uses a small-area equirectangular approximation centred on the photo's GPS
//! position: a pixel offset from the image centre is scaled to metres with a
//! pinhole meters-per-pixel estimate, then converted to degrees. The
//! approximation degrades for wide rectangles and near the poles.

use facade_lite_core::{
    Feature, FeatureCollection, Geometry, PhotoMetadata, PixelRect, Position, Ring,
    WindowProperties, PHOTO_ANNOTATION_SOURCE,
};
use nalgebra::{Point2, Point3};
use serde::Serialize;

use crate::error::{Error, Result};

/// Metres per degree of longitude at the equator
pub const METERS_PER_DEGREE_LON: f64 = 111_320.0;
/// Metres per degree of latitude
pub const METERS_PER_DEGREE_LAT: f64 = 110_540.0;
/// Used by the re-projector when a feature has no usable `meterPerPixel`
pub const FALLBACK_METER_PER_PIXEL: f64 = 0.01;

/// Pinhole camera assumptions behind the meters-per-pixel estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    /// Sensor width in millimetres (typical phone wide camera)
    pub sensor_width_mm: f64,
    /// Focal length used when the photo has none, millimetres
    pub default_focal_length_mm: f64,
    /// Assumed camera-to-facade distance, metres
    pub subject_distance_m: f64,
}

impl Default for CameraModel {
    fn default() -> Self {
        Self {
            sensor_width_mm: 5.6,
            default_focal_length_mm: 6.0,
            subject_distance_m: 10.0,
        }
    }
}

impl CameraModel {
    /// `(sensorWidth / imageWidth) * distance / focal / 1000`
    ///
    /// A missing, zero, negative or non-finite focal length falls back to
    /// `default_focal_length_mm`.
    pub fn meter_per_pixel(&self, image_width_px: f64, focal_length_mm: Option<f64>) -> f64 {
        let focal = focal_length_mm
            .filter(|f| f.is_finite() && *f > 0.0)
            .unwrap_or(self.default_focal_length_mm);
        let mm_per_pixel = self.sensor_width_mm / image_width_px;
        mm_per_pixel * self.subject_distance_m / focal / 1000.0
    }
}

/// A photo positioned in the world: GPS centre, pixel size and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoFrame {
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
    pub width: f64,
    pub height: f64,
    pub meter_per_pixel: f64,
}

impl PhotoFrame {
    /// Frame for projecting rectangles drawn on `meta`.
    ///
    /// Fails with [`Error::MissingGeoreference`] when the photo has no GPS
    /// position; altitude defaults to 0.
    pub fn from_metadata(image_name: &str, meta: &PhotoMetadata, camera: &CameraModel) -> Result<Self> {
        let (lat, lon) = match (meta.latitude, meta.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
            _ => return Err(Error::MissingGeoreference(image_name.to_string())),
        };
        if meta.width == 0 || meta.height == 0 {
            return Err(Error::InvalidPhoto(format!(
                "'{image_name}' has zero pixel dimensions"
            )));
        }

        let width = f64::from(meta.width);
        Ok(Self {
            lon,
            lat,
            alt: meta.altitude.filter(|a| a.is_finite()).unwrap_or(0.0),
            width,
            height: f64::from(meta.height),
            meter_per_pixel: camera.meter_per_pixel(width, meta.focal_length),
        })
    }

    /// Same frame with a different scale, e.g. the one recorded on a feature
    pub fn with_meter_per_pixel(mut self, meter_per_pixel: Option<f64>) -> Self {
        self.meter_per_pixel = meter_per_pixel
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(FALLBACK_METER_PER_PIXEL);
        self
    }

    #[inline]
    fn lon_scale(&self) -> f64 {
        METERS_PER_DEGREE_LON * self.lat.to_radians().cos()
    }

    /// Pixel → `(lon, lat, alt)`
    #[inline]
    pub fn pixel_to_world(&self, px: Point2<f64>) -> Point3<f64> {
        let dx = px.x - self.width / 2.0;
        let dy = px.y - self.height / 2.0;
        let lon = self.lon + (dx * self.meter_per_pixel) / self.lon_scale();
        let lat = self.lat - (dy * self.meter_per_pixel) / METERS_PER_DEGREE_LAT;
        Point3::new(lon, lat, self.alt)
    }

    /// `(lon, lat)` → pixel
    #[inline]
    pub fn world_to_pixel(&self, lon: f64, lat: f64) -> Point2<f64> {
        let dx = (lon - self.lon) * self.lon_scale();
        let dy = (self.lat - lat) * METERS_PER_DEGREE_LAT;
        Point2::new(
            self.width / 2.0 + dx / self.meter_per_pixel,
            self.height / 2.0 + dy / self.meter_per_pixel,
        )
    }

    /// Closed 5-position ring for one rectangle
    pub fn rect_to_ring(&self, rect: &PixelRect) -> Ring {
        let mut ring: Ring = rect
            .corners()
            .iter()
            .map(|&(x, y)| {
                let p = self.pixel_to_world(Point2::new(x, y));
                vec![p.x, p.y, p.z]
            })
            .collect();
        let first = ring[0].clone();
        ring.push(first);
        ring
    }
}

/// Project pixel rectangles drawn on one photo into window features.
///
/// Degenerate rectangles are skipped. Each feature carries `imageName`,
/// `buildingId`, `source`, `altitude`, `meterPerPixel` and the rectangle's
/// real-world `widthInMeters`/`heightInMeters`.
pub fn project_rects(
    frame: &PhotoFrame,
    rects: &[PixelRect],
    image_name: &str,
    building_id: &str,
) -> Result<FeatureCollection> {
    let mut features = Vec::with_capacity(rects.len());

    for (idx, rect) in rects.iter().enumerate() {
        if rect.is_degenerate() {
            tracing::debug!(index = idx, ?rect, "Skipping degenerate rectangle");
            continue;
        }

        let props = WindowProperties {
            image_name: Some(image_name.to_string()),
            building_id: Some(building_id.to_string()),
            source: Some(PHOTO_ANNOTATION_SOURCE.to_string()),
            altitude: Some(frame.alt),
            meter_per_pixel: Some(frame.meter_per_pixel),
            width_in_meters: Some(rect.width.abs() * frame.meter_per_pixel),
            height_in_meters: Some(rect.height.abs() * frame.meter_per_pixel),
            ..Default::default()
        };

        features.push(Feature::new(
            Geometry::polygon(frame.rect_to_ring(rect)),
            props.into_properties()?,
        ));
    }

    tracing::debug!(
        image = %image_name,
        building = %building_id,
        rects = rects.len(),
        features = features.len(),
        meter_per_pixel = frame.meter_per_pixel,
        "Projected rectangles"
    );

    Ok(FeatureCollection::new(features))
}

/// A re-projected polygon in photo pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelRing {
    /// Index of the source feature in its collection
    pub feature_index: usize,
    pub meter_per_pixel: f64,
    pub points: Vec<[f64; 2]>,
}

/// Re-project a lon/lat ring onto the photo described by `frame`
pub fn reproject_ring(frame: &PhotoFrame, ring: &[Position]) -> Vec<[f64; 2]> {
    ring.iter()
        .filter(|p| p.len() >= 2)
        .map(|p| {
            let px = frame.world_to_pixel(p[0], p[1]);
            [px.x, px.y]
        })
        .collect()
}

/// Re-project every polygon feature of a saved annotation.
///
/// Each feature uses its own recorded `meterPerPixel` (0.01 when missing);
/// non-polygon features are skipped.
pub fn reproject_collection(frame: &PhotoFrame, fc: &FeatureCollection) -> Vec<PixelRing> {
    fc.features
        .iter()
        .enumerate()
        .filter_map(|(idx, feature)| {
            let ring = feature.outer_ring()?;
            let local = frame.with_meter_per_pixel(feature.property_f64("meterPerPixel"));
            Some(PixelRing {
                feature_index: idx,
                meter_per_pixel: local.meter_per_pixel,
                points: reproject_ring(&local, ring),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use facade_lite_core::is_closed;

    fn photo(lat: f64, lon: f64) -> PhotoMetadata {
        PhotoMetadata {
            width: 1000,
            height: 1000,
            latitude: Some(lat),
            longitude: Some(lon),
            altitude: None,
            focal_length: Some(6.0),
        }
    }

    #[test]
    fn test_meter_per_pixel_formula() {
        let camera = CameraModel::default();
        let mpp = camera.meter_per_pixel(1000.0, Some(6.0));
        assert_relative_eq!(mpp, (5.6 / 1000.0) * 10.0 / 6.0 / 1000.0);
    }

    #[test]
    fn test_focal_length_fallback() {
        let camera = CameraModel::default();
        let expected = camera.meter_per_pixel(4000.0, Some(6.0));
        assert_relative_eq!(camera.meter_per_pixel(4000.0, None), expected);
        assert_relative_eq!(camera.meter_per_pixel(4000.0, Some(0.0)), expected);
        assert_relative_eq!(camera.meter_per_pixel(4000.0, Some(f64::NAN)), expected);
    }

    #[test]
    fn test_missing_gps_fails() {
        let mut meta = photo(0.0, 0.0);
        meta.longitude = None;
        let err = PhotoFrame::from_metadata("a.jpg", &meta, &CameraModel::default()).unwrap_err();
        assert!(matches!(err, Error::MissingGeoreference(ref name) if name == "a.jpg"));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut meta = photo(0.0, 0.0);
        meta.width = 0;
        let err = PhotoFrame::from_metadata("a.jpg", &meta, &CameraModel::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidPhoto(_)));
    }

    #[test]
    fn test_altitude_defaults_to_zero() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(1.0, 2.0), &CameraModel::default()).unwrap();
        assert_eq!(frame.alt, 0.0);
    }

    #[test]
    fn test_image_centre_maps_to_gps() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(-6.2, 106.8), &CameraModel::default()).unwrap();
        let p = frame.pixel_to_world(Point2::new(500.0, 500.0));
        assert_relative_eq!(p.x, 106.8);
        assert_relative_eq!(p.y, -6.2);
    }

    #[test]
    fn test_pixel_down_is_south_and_right_is_east() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(10.0, 20.0), &CameraModel::default()).unwrap();
        let p = frame.pixel_to_world(Point2::new(900.0, 900.0));
        assert!(p.x > 20.0);
        assert!(p.y < 10.0);
    }

    #[test]
    fn test_rings_are_closed_and_corner_ordered() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(10.0, 20.0), &CameraModel::default()).unwrap();
        let fc = project_rects(
            &frame,
            &[PixelRect::new(300.0, 200.0, -100.0, 50.0)],
            "a.jpg",
            "B1",
        )
        .unwrap();

        let ring = fc.features[0].outer_ring().unwrap();
        assert_eq!(ring.len(), 5);
        assert!(is_closed(ring));
        // top-left, top-right share latitude; top-right is east of top-left
        assert_eq!(ring[0][1], ring[1][1]);
        assert!(ring[1][0] > ring[0][0]);
        assert!(ring[2][1] < ring[1][1]);
    }

    #[test]
    fn test_degenerate_rects_skipped() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(0.0, 0.0), &CameraModel::default()).unwrap();
        let fc = project_rects(
            &frame,
            &[
                PixelRect::new(0.0, 0.0, 0.0, 10.0),
                PixelRect::new(10.0, 10.0, 20.0, 20.0),
            ],
            "a.jpg",
            "B1",
        )
        .unwrap();
        assert_eq!(fc.len(), 1);
    }

    #[test]
    fn test_feature_properties() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(0.0, 0.0), &CameraModel::default()).unwrap();
        let fc = project_rects(&frame, &[PixelRect::new(0.0, 0.0, -40.0, 20.0)], "a.jpg", "B1").unwrap();
        let f = &fc.features[0];
        assert_eq!(f.property_str("imageName"), Some("a.jpg"));
        assert_eq!(f.property_str("buildingId"), Some("B1"));
        assert_eq!(f.property_str("source"), Some("photo-annotation"));
        assert_eq!(f.property_f64("altitude"), Some(0.0));
        assert_relative_eq!(f.property_f64("widthInMeters").unwrap(), 40.0 * frame.meter_per_pixel);
        assert_relative_eq!(f.property_f64("heightInMeters").unwrap(), 20.0 * frame.meter_per_pixel);
    }

    #[test]
    fn test_reproject_fallback_meter_per_pixel() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(0.0, 0.0), &CameraModel::default()).unwrap();
        assert_eq!(frame.with_meter_per_pixel(None).meter_per_pixel, FALLBACK_METER_PER_PIXEL);
        assert_eq!(frame.with_meter_per_pixel(Some(-1.0)).meter_per_pixel, FALLBACK_METER_PER_PIXEL);
        assert_eq!(frame.with_meter_per_pixel(Some(0.5)).meter_per_pixel, 0.5);
    }

    #[test]
    fn test_reproject_collection_skips_non_polygons() {
        let frame = PhotoFrame::from_metadata("a.jpg", &photo(0.0, 0.0), &CameraModel::default()).unwrap();
        let mut fc = project_rects(&frame, &[PixelRect::new(100.0, 100.0, 50.0, 50.0)], "a.jpg", "B1").unwrap();
        fc.features.insert(
            0,
            Feature::new(Geometry::Point { coordinates: vec![0.0, 0.0] }, Default::default()),
        );

        let rings = reproject_collection(&frame, &fc);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].feature_index, 1);
        assert_eq!(rings[0].points.len(), 5);
        assert_relative_eq!(rings[0].points[0][0], 100.0, epsilon = 1e-6);
        assert_relative_eq!(rings[0].points[0][1], 100.0, epsilon = 1e-6);
    }
}
