// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Photo metadata extraction: pixel dimensions plus EXIF GPS and focal length.

use crate::error::ApiError;
use facade_lite_core::PhotoMetadata;
use std::io::Cursor;

fn rational(value: &exif::Value, index: usize) -> Option<f64> {
    match value {
        exif::Value::Rational(v) => v
            .get(index)
            .filter(|r| r.denom != 0)
            .map(|r| r.num as f64 / r.denom as f64),
        _ => None,
    }
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

fn gps_coordinate(exif: &exif::Exif, tag: exif::Tag, ref_tag: exif::Tag, negative: char) -> Option<f64> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    let value = dms_to_decimal(
        rational(&field.value, 0)?,
        rational(&field.value, 1).unwrap_or(0.0),
        rational(&field.value, 2).unwrap_or(0.0),
    );

    let hemisphere = exif
        .get_field(ref_tag, exif::In::PRIMARY)
        .map(|f| f.display_value().to_string())
        .unwrap_or_default();
    Some(if hemisphere.contains(negative) { -value } else { value })
}

fn gps_altitude(exif: &exif::Exif) -> Option<f64> {
    let field = exif.get_field(exif::Tag::GPSAltitude, exif::In::PRIMARY)?;
    let altitude = rational(&field.value, 0)?;
    // Ref 1 means below sea level
    let below = exif
        .get_field(exif::Tag::GPSAltitudeRef, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        == Some(1);
    Some(if below { -altitude } else { altitude })
}

/// Read camera metadata from an encoded photo.
///
/// Pixel dimensions are required; GPS and focal length are left empty when
/// the photo carries no EXIF block or lacks the tags.
pub fn extract_metadata(bytes: &[u8]) -> Result<PhotoMetadata, ApiError> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ApiError::InvalidPhoto(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ApiError::InvalidPhoto(e.to_string()))?;

    let mut metadata = PhotoMetadata {
        width,
        height,
        ..Default::default()
    };

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "Photo has no readable EXIF block");
            return Ok(metadata);
        }
    };

    metadata.latitude = gps_coordinate(&exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef, 'S');
    metadata.longitude = gps_coordinate(&exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef, 'W');
    metadata.altitude = gps_altitude(&exif);
    metadata.focal_length = exif
        .get_field(exif::Tag::FocalLength, exif::In::PRIMARY)
        .and_then(|f| rational(&f.value, 0));

    tracing::debug!(
        width,
        height,
        georeferenced = metadata.has_georeference(),
        focal_length = ?metadata.focal_length,
        "Extracted photo metadata"
    );
    Ok(metadata)
}
