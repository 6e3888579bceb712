// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building wall lookup
//!
//! Building footprints are `MultiPolygon` features whose ring vertices carry
//! a z coordinate. A ring touching the ground (any vertex with z == 0) is a
//! wall; roof and floor surfaces have no ground-level vertex.

use facade_lite_core::{Feature, FeatureCollection, Geometry, Position};
use serde::Serialize;

/// One ground-level ring of a building, used as a placement anchor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallSegment {
    /// Flattened `[lon, lat]` ring, vertices as given (closing vertex kept)
    pub coords: Vec<[f64; 2]>,
    /// Arithmetic mean of `coords`
    pub center: [f64; 2],
    /// 1-based index in ring-encounter order
    pub side: usize,
}

impl WallSegment {
    /// Squared planar distance from the wall centre, in degrees²
    #[inline]
    pub fn distance_squared(&self, lon: f64, lat: f64) -> f64 {
        let dx = lon - self.center[0];
        let dy = lat - self.center[1];
        dx * dx + dy * dy
    }

    /// Direction of the longest edge, `atan2(dy, dx)` in radians.
    ///
    /// Edges are compared by squared length; the first longest edge wins.
    /// Returns `None` for rings with fewer than two vertices or only
    /// zero-length edges.
    pub fn longest_edge_angle(&self) -> Option<f64> {
        let mut max_len = 0.0;
        let mut best = None;

        for edge in self.coords.windows(2) {
            let dx = edge[1][0] - edge[0][0];
            let dy = edge[1][1] - edge[0][1];
            let len = dx * dx + dy * dy;
            if len > max_len {
                max_len = len;
                best = Some(dy.atan2(dx));
            }
        }

        best
    }
}

fn has_ground_vertex(ring: &[Position]) -> bool {
    ring.iter().any(|p| p.get(2).copied() == Some(0.0))
}

fn centroid(coords: &[[f64; 2]]) -> [f64; 2] {
    let n = coords.len() as f64;
    let (sx, sy) = coords
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c[0], sy + c[1]));
    [sx / n, sy / n]
}

/// Wall rings of one footprint feature, side numbers continuing from
/// `first_side`
fn walls_of_feature(feature: &Feature, first_side: usize) -> Vec<WallSegment> {
    let Some(Geometry::MultiPolygon { coordinates }) = &feature.geometry else {
        return Vec::new();
    };

    let mut walls = Vec::new();
    for surface in coordinates {
        for ring in surface {
            if ring.is_empty() || !has_ground_vertex(ring) {
                continue;
            }
            let coords: Vec<[f64; 2]> = ring
                .iter()
                .filter(|p| p.len() >= 2)
                .map(|p| [p[0], p[1]])
                .collect();
            if coords.is_empty() {
                continue;
            }
            walls.push(WallSegment {
                center: centroid(&coords),
                coords,
                side: first_side + walls.len(),
            });
        }
    }
    walls
}

/// Wall segments of building `uid`.
///
/// Uses the first `MultiPolygon` feature whose `uid` property matches. An
/// unknown building or one without ground rings yields an empty list.
pub fn walls_for_building(footprints: &FeatureCollection, uid: &str) -> Vec<WallSegment> {
    let building = footprints.features.iter().find(|f| {
        f.property_str("uid") == Some(uid)
            && matches!(f.geometry, Some(Geometry::MultiPolygon { .. }))
    });

    match building {
        Some(feature) => {
            let walls = walls_of_feature(feature, 1);
            tracing::debug!(uid = %uid, walls = walls.len(), "Extracted wall segments");
            walls
        }
        None => {
            tracing::debug!(uid = %uid, "Building not found in footprints");
            Vec::new()
        }
    }
}

/// Index of the wall whose centre is nearest to `(lon, lat)`.
///
/// Ties keep the first wall encountered.
pub fn nearest_wall(walls: &[WallSegment], lon: f64, lat: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, wall) in walls.iter().enumerate() {
        let d = wall.distance_squared(lon, lat);
        match best {
            Some((_, min)) if d >= min => {}
            _ => best = Some((idx, d)),
        }
    }
    best.map(|(idx, _)| idx)
}
