// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facade layout engine
//!
//! Turns a building's placed window polygons into oriented boxes:
//!
//! 1. centroid of each polygon
//! 2. greedy row bucketing by latitude
//! 3. left-to-right ordering by longitude within a row
//! 4. horizontal packing centred on the row
//! 5. orientation from the nearest wall (or the camera reference table)
//! 6. bottom-up stacking of rows
//! 7. a wall-anchored transform pushed out to sit flush on the facade
//!
//! The constants are empirical calibration; keep them as configured rather
//! than re-deriving them.

use facade_lite_core::{Feature, ReferenceTable};
use nalgebra::Matrix4;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

use crate::transform::{
    geodetic_to_ecef, heading_pitch_roll_frame, origin_of, to_column_major, translation,
    HeadingPitchRoll,
};
use crate::walls::{nearest_wall, WallSegment};

/// Box depth, scene units
pub const FIXED_DEPTH: f64 = 0.3;
/// Metres → scene units for box width and height
pub const SCALE_FACTOR: f64 = 2000.0;
/// Base height of the first row
pub const BASE_Z: f64 = 0.2;
/// Gap between neighbouring boxes of one row
pub const XY_GAP: f64 = 1.0;
/// Row tolerance, compared against the squared latitude difference (deg²)
pub const ROW_THRESHOLD: f64 = 8e-9;
/// Calibration added to every wall-derived heading, degrees
pub const HEADING_OFFSET_DEG: f64 = -13.0;
/// Smallest gap between stacked rows
pub const MIN_ROW_GAP: f64 = 0.003;
/// Buffer added to the half-width when pushing a box onto the facade
pub const FACADE_CLEARANCE: f64 = 0.9;
/// Size used when a feature has no usable `widthInMeters`/`heightInMeters`
pub const DEFAULT_SIZE_M: f64 = 1.0;

/// Layout tuning knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub fixed_depth: f64,
    pub scale_factor: f64,
    pub base_z: f64,
    pub xy_gap: f64,
    pub row_threshold: f64,
    pub heading_offset_deg: f64,
    pub min_row_gap: f64,
    pub facade_clearance: f64,
    pub default_size_m: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            fixed_depth: FIXED_DEPTH,
            scale_factor: SCALE_FACTOR,
            base_z: BASE_Z,
            xy_gap: XY_GAP,
            row_threshold: ROW_THRESHOLD,
            heading_offset_deg: HEADING_OFFSET_DEG,
            min_row_gap: MIN_ROW_GAP,
            facade_clearance: FACADE_CLEARANCE,
            default_size_m: DEFAULT_SIZE_M,
        }
    }
}

/// Where a placement's orientation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrientationSource {
    /// Nearest wall segment, by side number
    Wall { side: usize },
    /// Camera reference table entry of the source photo
    Reference,
    /// No wall and no reference entry
    Identity,
}

/// One window laid out as an oriented box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    /// Index of the source feature in the input slice
    pub feature_index: usize,
    pub image_name: Option<String>,
    /// Row number, bottom row first
    pub row: usize,
    /// `[lon, lat, height]` of the frame origin
    pub anchor: [f64; 3],
    pub orientation: HeadingPitchRoll,
    pub source: OrientationSource,
    /// `[width/2, depth/2, height/2]` in scene units
    pub half_extents: [f64; 3],
    /// Horizontal offset within the row
    pub x_offset: f64,
    /// Box centre, ECEF metres
    pub center: [f64; 3],
    /// Box-local → ECEF, column-major
    pub model_matrix: [f64; 16],
}

/// Mean lon/lat of a polygon feature's outer ring.
///
/// `None` for non-polygons and empty rings.
pub fn feature_centroid(feature: &Feature) -> Option<(f64, f64)> {
    let ring = feature.outer_ring()?;
    let mut n = 0usize;
    let (mut sx, mut sy) = (0.0, 0.0);
    for p in ring.iter().filter(|p| p.len() >= 2) {
        sx += p[0];
        sy += p[1];
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some((sx / n as f64, sy / n as f64))
}

/// Height range of a feature's ring.
///
/// A vertex contributes its z when present and non-zero, otherwise the
/// feature's `altitude` property, otherwise 0.
pub fn feature_z_range(feature: &Feature) -> (f64, f64) {
    let altitude = feature.property_f64("altitude").filter(|a| *a != 0.0);
    let zs = feature
        .outer_ring()
        .into_iter()
        .flatten()
        .map(|p| match p.get(2).copied() {
            Some(z) if z != 0.0 && z.is_finite() => z,
            _ => altitude.unwrap_or(0.0),
        });

    let (min, max) = zs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), z| {
        (lo.min(z), hi.max(z))
    });
    if min > max {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}

/// Greedy single-pass row clustering.
///
/// Indices are visited in ascending latitude; each joins the first row whose
/// key (its first member's latitude) satisfies `(key - lat)² < threshold`,
/// otherwise it opens a new row. Rows come out in ascending key order.
pub fn bucket_rows(latitudes: &[f64], threshold: f64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..latitudes.len()).collect();
    order.sort_by(|&a, &b| latitudes[a].total_cmp(&latitudes[b]));

    let mut rows: Vec<(f64, Vec<usize>)> = Vec::new();
    for idx in order {
        let lat = latitudes[idx];
        match rows.iter_mut().find(|(key, _)| {
            let d = key - lat;
            d * d < threshold
        }) {
            Some((_, members)) => members.push(idx),
            None => rows.push((lat, vec![idx])),
        }
    }

    rows.into_iter().map(|(_, members)| members).collect()
}

/// Centre x of each box when `widths` are packed left-to-right with `gap`
/// between them and the whole row centred on 0.
pub fn row_offsets(widths: &[f64], gap: f64) -> Vec<f64> {
    if widths.is_empty() {
        return Vec::new();
    }
    let total: f64 = widths.iter().sum::<f64>() + gap * (widths.len() - 1) as f64;
    let mut cursor = -total / 2.0;

    widths
        .iter()
        .map(|w| {
            let x = cursor + w / 2.0;
            cursor += w + gap;
            x
        })
        .collect()
}

/// Vertical gap between a row and the next one
#[inline]
pub fn row_gap(current_max_z: f64, next_min_z: f64, min_gap: f64) -> f64 {
    (next_min_z - current_max_z).max(min_gap)
}

/// Heading of a box placed on `wall`: the normal of its longest edge plus
/// the calibration offset.
pub fn wall_heading(wall: &WallSegment, offset_deg: f64) -> f64 {
    let base = wall
        .longest_edge_angle()
        .map(|angle| angle + FRAC_PI_2)
        .unwrap_or(0.0);
    base + offset_deg.to_radians()
}

struct LayoutItem<'a> {
    index: usize,
    feature: &'a Feature,
    lon: f64,
    lat: f64,
    width: f64,
    height: f64,
}

fn scaled_size(value: Option<f64>, config: &LayoutConfig) -> f64 {
    let metres = value
        .filter(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(config.default_size_m);
    metres * config.scale_factor
}

/// Lay out the placed windows of one building.
///
/// Features without polygon coordinates are skipped. With no walls the
/// orientation comes from `reference` (keyed by the feature's `imageName`),
/// or is the identity; such boxes sit at their own centroid.
pub fn layout_facade(
    features: &[Feature],
    walls: &[WallSegment],
    reference: Option<&ReferenceTable>,
    config: &LayoutConfig,
) -> Vec<Placement> {
    let items: Vec<LayoutItem> = features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let Some((lon, lat)) = feature_centroid(feature) else {
                tracing::debug!(index, "Skipping feature without coordinates");
                return None;
            };
            Some(LayoutItem {
                index,
                feature,
                lon,
                lat,
                width: scaled_size(feature.property_f64("widthInMeters"), config),
                height: scaled_size(feature.property_f64("heightInMeters"), config),
            })
        })
        .collect();

    let latitudes: Vec<f64> = items.iter().map(|item| item.lat).collect();
    let mut rows = bucket_rows(&latitudes, config.row_threshold);
    for row in &mut rows {
        row.sort_by(|&a, &b| items[a].lon.total_cmp(&items[b].lon));
    }

    if walls.is_empty() {
        tracing::warn!(
            features = items.len(),
            "No wall segments; falling back to reference orientation at GPS positions"
        );
    }

    let mut placements = Vec::with_capacity(items.len());
    let mut current_z = config.base_z;

    for (row_idx, row) in rows.iter().enumerate() {
        let widths: Vec<f64> = row.iter().map(|&i| items[i].width).collect();
        let offsets = row_offsets(&widths, config.xy_gap);

        for (slot, &item_idx) in row.iter().enumerate() {
            let item = &items[item_idx];
            placements.push(place_item(item, row_idx, offsets[slot], current_z, walls, reference, config));
        }

        if let Some(next) = rows.get(row_idx + 1) {
            let current_max = row
                .iter()
                .map(|&i| feature_z_range(items[i].feature).1)
                .fold(f64::NEG_INFINITY, f64::max);
            let next_min = next
                .iter()
                .map(|&i| feature_z_range(items[i].feature).0)
                .fold(f64::INFINITY, f64::min);
            let gap = row_gap(current_max, next_min, config.min_row_gap);
            tracing::debug!(row = row_idx, gap, "Row gap");
            current_z += gap;
        }
    }

    tracing::info!(
        placed = placements.len(),
        skipped = features.len() - items.len(),
        rows = rows.len(),
        walls = walls.len(),
        "Laid out facade windows"
    );

    placements
}

fn place_item(
    item: &LayoutItem,
    row: usize,
    x_offset: f64,
    row_z: f64,
    walls: &[WallSegment],
    reference: Option<&ReferenceTable>,
    config: &LayoutConfig,
) -> Placement {
    let image_name = item
        .feature
        .property_str("imageName")
        .map(|s| s.trim().to_string());
    let z = row_z + item.height / 2.0;

    let (anchor_lon, anchor_lat, orientation, source, local) =
        match nearest_wall(walls, item.lon, item.lat) {
            Some(wall_idx) => {
                let wall = &walls[wall_idx];
                let hpr = HeadingPitchRoll::new(wall_heading(wall, config.heading_offset_deg), 0.0, 0.0);
                tracing::debug!(
                    lon = item.lon,
                    lat = item.lat,
                    side = wall.side,
                    "Window placed on wall"
                );
                // Local -Y points from the wall plane out of the facade
                let push = item.width / 2.0 + config.facade_clearance;
                (
                    wall.center[0],
                    wall.center[1],
                    hpr,
                    OrientationSource::Wall { side: wall.side },
                    translation(x_offset, -push, 0.0),
                )
            }
            None => {
                let pose = image_name
                    .as_deref()
                    .and_then(|name| reference.and_then(|table| table.get(name)));
                let (hpr, source) = match pose {
                    Some(pose) => {
                        let (h, p, r) = pose.heading_pitch_roll();
                        (HeadingPitchRoll::new(h, p, r), OrientationSource::Reference)
                    }
                    None => (HeadingPitchRoll::identity(), OrientationSource::Identity),
                };
                (item.lon, item.lat, hpr, source, Matrix4::identity())
            }
        };

    let origin = geodetic_to_ecef(anchor_lon, anchor_lat, z);
    let model = heading_pitch_roll_frame(&origin, &orientation) * local;
    let center = origin_of(&model);

    Placement {
        feature_index: item.index,
        image_name,
        row,
        anchor: [anchor_lon, anchor_lat, z],
        orientation,
        source,
        half_extents: [
            item.width / 2.0,
            config.fixed_depth / 2.0,
            item.height / 2.0,
        ],
        x_offset,
        center: [center.x, center.y, center.z],
        model_matrix: to_column_major(&model),
    }
}
